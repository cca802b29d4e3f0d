use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;
use zipper_bot::Engine;
use zipper_core::model::dice::MAX_DICE;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::race::{DecisionSummary, GameOutcome};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in race results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
    goal: u32,
    reach_table_max: u32,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        Ok(Self {
            baseline,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
            goal: config.games.goal,
            reach_table_max: config.metrics.reach_table_max,
        })
    }

    /// Record every agent's outcome for one game (same dice seed).
    pub fn record_game(
        &mut self,
        game_index: usize,
        outcomes: &[GameOutcome],
    ) -> Result<(), AnalyticsError> {
        let baseline_turns = outcomes
            .iter()
            .find(|outcome| outcome.agent_name == self.baseline)
            .map(|outcome| outcome.turns as f64)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(
                    self.baseline.clone(),
                    format!("G{game_index:05}"),
                )
            })?;

        for outcome in outcomes {
            let acc = self
                .agents
                .get_mut(&outcome.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(outcome.agent_name.clone()))?;
            acc.record_game(outcome);

            if outcome.agent_name != self.baseline {
                self.comparisons
                    .entry(outcome.agent_name.clone())
                    .or_insert_with(ComparisonAccumulator::new)
                    .record(outcome.turns as f64 - baseline_turns);
            }
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        if !reports.iter().any(|report| report.name == self.baseline) {
            return Err(AnalyticsError::MissingBaseline(self.baseline));
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            let (p_value, sample_size) = match self.comparisons.remove(&report.name) {
                Some(comp) if report.name != self.baseline => comp.wilcoxon_signed_rank(),
                _ => (1.0, 0),
            };
            comparisons.push(ComparisonReport {
                agent: report.name.clone(),
                p_value,
                sample_size,
            });
        }

        let reach_max = self.goal.min(self.reach_table_max);
        let reach_table = Engine::default().threshold_curve(MAX_DICE, reach_max);

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            goal: self.goal,
            agents: reports,
            comparisons,
            reach_table,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    per_game_turns: Vec<f64>,
    goals_reached: u32,
    turns_played: u64,
    busts: u64,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            per_game_turns: Vec::new(),
            goals_reached: 0,
            turns_played: 0,
            busts: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_game(&mut self, outcome: &GameOutcome) {
        let DecisionSummary {
            decisions,
            total_ms,
            ..
        } = outcome.metrics;
        self.per_game_turns.push(outcome.turns as f64);
        self.turns_played += outcome.turns as u64;
        self.busts += outcome.busts as u64;
        if outcome.reached_goal {
            self.goals_reached += 1;
        }
        self.total_latency_ms += total_ms;
        self.total_decisions += u64::from(decisions);
    }

    fn into_report(self) -> AgentReport {
        let games = self.per_game_turns.len();
        let mean_turns = if games == 0 {
            0.0
        } else {
            self.per_game_turns.iter().sum::<f64>() / games as f64
        };
        let goal_rate = if games == 0 {
            0.0
        } else {
            f64::from(self.goals_reached) / games as f64
        };
        let bust_rate = if self.turns_played == 0 {
            0.0
        } else {
            self.busts as f64 / self.turns_played as f64
        };
        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };

        AgentReport {
            name: self.config.name,
            kind: self.config.kind,
            params: self.config.params,
            games,
            mean_turns,
            ci95: confidence_interval(&self.per_game_turns),
            goal_rate,
            bust_rate,
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0, // filled by enrich()
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided signed-rank test with the normal approximation, returning
    /// the p-value and the number of non-zero differences.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let mut paired: Vec<(f64, f64)> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .map(|d| (d.abs(), d.signum()))
            .collect();
        let n = paired.len();
        if n == 0 {
            return (1.0, 0);
        }
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Tied magnitudes share their average rank.
        let mut w_plus = 0.0;
        let mut w_minus = 0.0;
        let mut tie_adjustment = 0.0;
        let mut i = 0;
        while i < n {
            let mut j = i;
            while j + 1 < n && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for &(_, sign) in &paired[i..=j] {
                if sign > 0.0 {
                    w_plus += rank;
                } else {
                    w_minus += rank;
                }
            }
            let ties = (j - i + 1) as f64;
            if ties > 1.0 {
                tie_adjustment += (ties.powi(3) - ties) / 48.0;
            }
            i = j + 1;
        }

        let w: f64 = f64::min(w_plus, w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub goal: u32,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    /// Probability of banking at least each target in one six-dice turn.
    pub reach_table: Vec<(u32, f64)>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_mean = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.mean_turns)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.mean_turns - baseline_mean;
        }

        self
    }

    pub fn p_value(&self, agent: &str) -> f64 {
        self.comparisons
            .iter()
            .find(|c| c.agent == agent)
            .map(|c| c.p_value)
            .unwrap_or(1.0)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Race Summary\n\n");
        rows.push_str(&format!(
            "Goal: {} points. Baseline: {}. Latency budget: {} ms average per decision\n\n",
            self.goal, self.baseline, self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Games | Mean turns | Δ vs baseline | 95% CI | Goal % | Bust % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|-------|------------|---------------|--------|--------|--------|-----------------|-------------|---------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {mean:.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {goal:.1}% | {bust:.1}% | {latency:.3} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                mean = agent.mean_turns,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                goal = agent.goal_rate * 100.0,
                bust = agent.bust_rate * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = self.p_value(&agent.name),
            ));
        }

        if !self.reach_table.is_empty() {
            rows.push_str("\n## Single-turn reach probability (six dice)\n\n");
            rows.push_str("| Target | P(reach) |\n");
            rows.push_str("|--------|----------|\n");
            for (target, p) in &self.reach_table {
                rows.push_str(&format!("| {target} | {p:.4} |\n"));
            }
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("delta_turns.png");
        let baseline = self.baseline.clone();
        let mut agents = self.agents.clone();
        agents.sort_by(|a, b| a.delta_vs_baseline.total_cmp(&b.delta_vs_baseline));

        // plotters can panic without font support; keep the run alive.
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let y_min = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, f64::min);
            let y_max = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, f64::max);
            let margin = ((y_max - y_min).abs() * 0.1).max(0.2);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(
                    "Mean turns delta vs baseline (lower is better)",
                    ("sans-serif", 22),
                )
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..agents.len(), (y_min - margin)..(y_max + margin))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Δ turns vs baseline")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == baseline {
                        &BLUE
                    } else if agent.delta_vs_baseline <= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new(
                        [(idx, 0.0), (idx + 1, agent.delta_vs_baseline)],
                        color.filled(),
                    )
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);
            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;
            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub games: usize,
    pub mean_turns: f64,
    pub ci95: (f64, f64),
    pub goal_rate: f64,
    pub bust_rate: f64,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    if samples.len() == 1 {
        return (mean, mean);
    }
    let variance = samples
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (samples.len() as f64 - 1.0);
    let std_error = (variance / samples.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::DecisionSummary;

    const YAML: &str = r#"
run_id: "analytics"
games:
  seed: 1
  count: 4
  goal: 200
agents:
  - name: "base"
    kind: "greedy"
  - name: "smart"
    kind: "goal"
outputs:
  jsonl: "games.jsonl"
  summary_md: "summary.md"
  plots_dir: "plots"
metrics:
  baseline: "base"
"#;

    fn config() -> BenchmarkConfig {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(YAML).expect("yaml");
        cfg.validate().expect("valid");
        cfg
    }

    fn outcome(agent: &str, kind: AgentKind, turns: usize, busts: usize) -> GameOutcome {
        GameOutcome {
            agent_name: agent.to_string(),
            kind,
            turns,
            reached_goal: true,
            final_total: 200.0,
            busts,
            metrics: DecisionSummary {
                decisions: 2 * turns as u32,
                avg_ms_per_decision: 0.5,
                total_ms: turns as f64,
            },
        }
    }

    fn collected(smart_turns: &[usize]) -> AnalyticsSummary {
        let mut collector = AnalyticsCollector::new(&config()).expect("collector");
        for (game, &turns) in smart_turns.iter().enumerate() {
            collector
                .record_game(
                    game,
                    &[
                        outcome("base", AgentKind::Greedy, 6, 2),
                        outcome("smart", AgentKind::Goal, turns, 1),
                    ],
                )
                .expect("record");
        }
        collector.finalize().expect("finalize")
    }

    #[test]
    fn reports_means_rates_and_deltas() {
        let summary = collected(&[3, 4, 5, 4]);
        let base = &summary.agents[0];
        let smart = &summary.agents[1];
        assert_eq!(base.games, 4);
        assert_eq!(base.mean_turns, 6.0);
        assert_eq!(base.ci95, (6.0, 6.0));
        assert_eq!(smart.mean_turns, 4.0);
        assert_eq!(smart.delta_vs_baseline, -2.0);
        assert_eq!(smart.goal_rate, 1.0);
        assert!((base.bust_rate - 8.0 / 24.0).abs() < 1e-12);
        assert!((smart.average_ms_per_decision - 0.5).abs() < 1e-12);
        assert_eq!(summary.p_value("base"), 1.0);
        assert_eq!(summary.reach_table.len(), 4);
    }

    #[test]
    fn missing_baseline_in_game_is_an_error() {
        let mut collector = AnalyticsCollector::new(&config()).expect("collector");
        let err = collector
            .record_game(0, &[outcome("smart", AgentKind::Goal, 3, 0)])
            .expect_err("baseline absent");
        assert!(matches!(err, AnalyticsError::MissingBaselineGame(..)));
    }

    #[test]
    fn wilcoxon_identical_samples_is_not_significant() {
        let mut comp = ComparisonAccumulator::new();
        for _ in 0..10 {
            comp.record(0.0);
        }
        assert_eq!(comp.wilcoxon_signed_rank(), (1.0, 0));
    }

    #[test]
    fn wilcoxon_consistent_shift_is_significant() {
        let mut comp = ComparisonAccumulator::new();
        for i in 0..30 {
            comp.record(-1.0 - (i % 5) as f64);
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 30);
        assert!(p < 0.001, "p = {p}");
    }

    #[test]
    fn markdown_lists_agents_and_reach_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.md");
        collected(&[5, 6, 7, 6]).write_markdown(&path).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("| base | Greedy | 4 |"));
        assert!(text.contains("| smart | Goal | 4 |"));
        assert!(text.contains("## Single-turn reach probability"));
        assert!(text.contains("| 200 |"));
    }

    #[test]
    fn confidence_interval_brackets_mean() {
        let (low, high) = confidence_interval(&[2.0, 4.0, 6.0]);
        assert!(low < 4.0 && 4.0 < high);
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }
}
