//! Headless skirmish runner.
//!
//! Runs a scenario without graphics and prints a JSON summary.
//! Designed for CI testing and determinism verification.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario for 3600 ticks
//! cargo run -p skirmish_headless -- run --scenario scenarios/duel.ron
//!
//! # Stop as soon as one player is left
//! cargo run -p skirmish_headless -- run --scenario scenarios/duel.ron --until-victory
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --scenario scenarios/duel.ron --runs 5
//! ```
//!
//! Output (stdout): the JSON summary.
//! Logs (stderr): debug information. `RUST_LOG` overrides the level.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{run_scenario, verify, RunLimits, Scenario, ScenarioError};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for CI and determinism checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print a JSON summary
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Maximum number of ticks to simulate
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Stop as soon as one player is left standing
        #[arg(long)]
        until_victory: bool,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Ticks per run
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("Failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Non-determinism detected: {0} distinct final hashes")]
    Diverged(usize),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for the summary
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            until_victory,
        } => cmd_run(scenario, ticks, until_victory),
        Commands::Verify {
            scenario,
            ticks,
            runs,
        } => cmd_verify(scenario, ticks, runs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run a single scenario
fn cmd_run(path: PathBuf, ticks: u64, until_victory: bool) -> Result<(), CliError> {
    info!("Running scenario: {}", path.display());

    let scenario = Scenario::load(&path)?;
    let limits = RunLimits {
        max_ticks: ticks,
        until_victory,
    };
    let summary = run_scenario(&scenario, limits)?;

    println!("{}", summary.to_json()?);
    Ok(())
}

/// Run a scenario several times and compare final hashes
fn cmd_verify(path: PathBuf, ticks: u64, runs: u32) -> Result<(), CliError> {
    info!(
        "Verifying determinism: {} ({} runs, {} ticks)",
        path.display(),
        runs,
        ticks
    );

    let scenario = Scenario::load(&path)?;
    let report = verify(&scenario, ticks, runs)?;

    if !report.is_deterministic() {
        let mut unique = report.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        return Err(CliError::Diverged(unique.len()));
    }

    info!("PASS: All {} runs produced identical results", runs);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
