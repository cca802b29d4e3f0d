use std::path::PathBuf;

use clap::Parser;

use zipper_bench::config::{BenchmarkConfig, ResolvedOutputs};
use zipper_bench::logging::init_logging;
use zipper_bench::race::RaceRunner;

/// Race harness for Zipper policies.
#[derive(Debug, Parser)]
#[command(
    name = "zipper-bench",
    author,
    version,
    about = "Deterministic Zipper race harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/race.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for the dice streams.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the goal every agent races to.
    #[arg(long, value_name = "POINTS")]
    goal: Option<u32>,

    /// Exit after validating the configuration (no race is run).
    #[arg(long)]
    validate_only: bool,

    /// Log every policy decision regardless of config (forces ZIPPER_DECISION_DETAILS=1).
    #[arg(long)]
    log_decisions: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(goal) = cli.goal {
        config.games.goal = goal;
    }

    if cli.log_decisions {
        config.logging.decision_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let goal = config.games.goal;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({games} games to {goal})",
        if agent_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = RaceRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: race execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Race complete for '{run_id}': {} games x {} agents -> {} rows at {}",
        summary.games_played,
        summary.agents,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Turn delta plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
