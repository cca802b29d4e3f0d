mod agents;
mod seeds;

pub use agents::{AgentBlueprint, AgentError};
pub use seeds::GameSeeds;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};
use zipper_bot::{Policy, TurnAction, TurnContext};
use zipper_core::model::dice::DiceError;
use zipper_core::model::turn::{Turn, TurnError};
use zipper_core::scoring::{Match, enumerate_matches};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentKind, BenchmarkConfig, ResolvedOutputs};
use crate::roller::DiceRoller;

/// Races every configured agent to the goal over a shared set of dice seeds.
pub struct RaceRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub agents: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

impl RaceRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Play every game, streaming JSONL rows to disk, then write the summary.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        // Policies live for the whole run so engine caches carry across games.
        let mut players: Vec<(&AgentBlueprint, Box<dyn Policy>)> = self
            .agents
            .iter()
            .map(|agent| (agent, agent.spawn_policy()))
            .collect();

        let seeds = GameSeeds::new(self.config.games.seed.unwrap_or(0), self.config.games.count);
        let mut rows_written = 0usize;
        for (game_index, game_seed) in seeds.enumerate() {
            let mut outcomes = Vec::with_capacity(players.len());
            for (agent, policy) in players.iter_mut() {
                let outcome = self.play_game(game_index, game_seed, agent, policy.as_mut())?;
                write_game_row(&mut writer, &self.config, game_index, game_seed, &outcome)?;
                rows_written += 1;
                outcomes.push(outcome);
            }
            analytics.record_game(game_index, &outcomes)?;
        }

        writer.flush()?;

        for (agent, policy) in &players {
            log_cache_stats(&agent.name, policy.as_ref());
        }

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {err}");
                None
            }
        };

        let telemetry_path = self.logging_enabled.then(|| {
            self.outputs
                .summary_md
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("telemetry.jsonl")
        });

        Ok(RunSummary {
            games_played: self.config.games.count,
            agents: self.agents.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        game_seed: u64,
        agent: &AgentBlueprint,
        policy: &mut dyn Policy,
    ) -> Result<GameOutcome, RunnerError> {
        let goal = f64::from(self.config.games.goal);
        let mut roller = DiceRoller::seeded(game_seed);
        let mut metrics = DecisionMetrics::default();
        let mut total = 0.0;
        let mut turns = 0usize;
        let mut busts = 0usize;

        while total < goal && turns < self.config.games.max_turns {
            turns += 1;
            let mut turn = Turn::new();
            while let Some(in_hand) = turn.dice_in_hand() {
                let ctx = TurnContext {
                    roll: roller.roll(in_hand)?,
                    pot: turn.pot(),
                    total,
                    goal,
                };
                let start = Instant::now();
                let action = policy.choose(&ctx);
                let elapsed_ms = metrics.record(start.elapsed());

                if self.logging_enabled && tracing::enabled!(Level::INFO) {
                    let picked = action
                        .matched()
                        .map(|pick| pick.used.to_string())
                        .unwrap_or_default();
                    event!(
                        target: "zipper_bench::turn",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        game_index = game_index as u32,
                        agent = %agent.name,
                        turn = turns as u32,
                        roll = %ctx.roll,
                        pot = ctx.pot,
                        total,
                        action = action.label(),
                        picked = %picked,
                        elapsed_ms
                    );
                }

                let legal = enumerate_matches(ctx.roll);
                match action {
                    TurnAction::Bust => {
                        if legal.iter().any(|pick| ctx.is_legal(pick)) {
                            return Err(RunnerError::illegal(
                                agent, game_index, &ctx, "declared a bust with a legal pick available",
                            ));
                        }
                        turn.bust()?;
                        busts += 1;
                    }
                    TurnAction::Bank(pick) => {
                        check_pick(agent, game_index, &ctx, &legal, &pick)?;
                        total += turn.bank(&pick)?;
                    }
                    TurnAction::Reroll(pick) => {
                        check_pick(agent, game_index, &ctx, &legal, &pick)?;
                        turn.set_aside(&pick)?;
                    }
                }
            }
        }

        Ok(GameOutcome {
            agent_name: agent.name.clone(),
            kind: agent.kind,
            turns,
            reached_goal: total == goal,
            final_total: total,
            busts,
            metrics: metrics.finalize(),
        })
    }
}

/// A pick must come straight from the enumerator and keep the total within the goal.
fn check_pick(
    agent: &AgentBlueprint,
    game_index: usize,
    ctx: &TurnContext,
    legal: &[Match],
    pick: &Match,
) -> Result<(), RunnerError> {
    if !legal.contains(pick) {
        return Err(RunnerError::illegal(agent, game_index, ctx, "pick is not a match of the roll"));
    }
    if !ctx.is_legal(pick) {
        return Err(RunnerError::illegal(agent, game_index, ctx, "pick overshoots the goal"));
    }
    Ok(())
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    game_seed: u64,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: &config.run_id,
        game_id: format!("G{game_index:05}"),
        game_index,
        game_seed,
        agent: &outcome.agent_name,
        kind: outcome.kind,
        goal: config.games.goal,
        turns: outcome.turns,
        reached_goal: outcome.reached_goal,
        final_total: outcome.final_total,
        busts: outcome.busts,
        decisions: outcome.metrics.decisions,
        speed_ms_decision: outcome.metrics.avg_ms_per_decision,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn log_cache_stats(agent: &str, policy: &dyn Policy) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    if let Some(stats) = policy.cache_stats() {
        event!(
            target: "zipper_bench::cache",
            Level::DEBUG,
            agent,
            rolls = stats.rolls,
            matches = stats.matches,
            continuation = stats.continuation,
            threshold = stats.threshold,
            turns = stats.turns,
        );
    }
}

/// One agent's result for one game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub agent_name: String,
    pub kind: AgentKind,
    /// Turns taken, capped at `games.max_turns`.
    pub turns: usize,
    pub reached_goal: bool,
    pub final_total: f64,
    pub busts: usize,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: String,
    game_index: usize,
    game_seed: u64,
    agent: &'a str,
    kind: AgentKind,
    goal: u32,
    turns: usize,
    reached_goal: bool,
    final_total: f64,
    busts: usize,
    decisions: u32,
    speed_ms_decision: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("dice roll failed: {0}")]
    Dice(#[from] DiceError),
    #[error("turn rejected a move: {0}")]
    Turn(#[from] TurnError),
    #[error("agent '{agent}' made an illegal move in game {game_index} on roll {roll}: {reason}")]
    IllegalMove {
        agent: String,
        game_index: usize,
        roll: String,
        reason: &'static str,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn illegal(
        agent: &AgentBlueprint,
        game_index: usize,
        ctx: &TurnContext,
        reason: &'static str,
    ) -> Self {
        RunnerError::IllegalMove {
            agent: agent.name.clone(),
            game_index,
            roll: ctx.roll.to_string(),
            reason,
        }
    }
}
