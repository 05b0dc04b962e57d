use std::path::PathBuf;

use clap::Parser;

use sparsebelief_core::AppInfo;
use sparsebelief_replay::config::{ReplayConfig, ResolvedOutputs};
use sparsebelief_replay::logging::init_logging;
use sparsebelief_replay::replay::ReplayRunner;

/// Replays a sequence of observations through a sparse Bayesian belief.
#[derive(Debug, Parser)]
#[command(
    name = "sparsebelief-replay",
    author,
    version,
    about = "Replay observations through a sparse Bayesian belief"
)]
struct Cli {
    /// Path to the YAML scenario file.
    #[arg(short, long, value_name = "FILE", default_value = "scenarios/dice.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Append observations after those listed in the scenario.
    #[arg(short, long = "observe", value_name = "OBSERVATION")]
    observations: Vec<String>,

    /// Exit after validating the scenario (no observations are replayed).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReplayConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    config.observations.extend(cli.observations);
    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let hypotheses = config.prior.len();
    let steps = config.observations.len();

    println!(
        "{} {}: loaded scenario '{run_id}' with {hypotheses} hypothes{} and {steps} observation{}",
        AppInfo::name(),
        AppInfo::version(),
        if hypotheses == 1 { "is" } else { "es" },
        if steps == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: replay skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let summary = ReplayRunner::new(config, outputs).run()?;

    println!(
        "Replay complete for '{run_id}': {} observations → {} rows at {}",
        summary.steps_applied,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    match summary.top.as_ref() {
        Some(top) => println!(
            "Most probable of {} hypotheses: {} ({:.6})",
            summary.hypotheses, top.key, top.weight
        ),
        None => println!("No hypotheses remain."),
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
