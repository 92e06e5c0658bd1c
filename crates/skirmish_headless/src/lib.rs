//! Headless scenario runner for CI and determinism verification.
//!
//! Loads a RON [`Scenario`], builds the starting [`World`](skirmish_core::world::World),
//! ticks it without any rendering and reports a [`RunSummary`].
//!
//! # Output
//!
//! - **stdout**: the JSON run summary
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a scenario until one player is left
//! cargo run -p skirmish_headless -- run --scenario scenarios/duel.ron --until-victory
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --scenario scenarios/duel.ron --runs 5
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, run_world, verify, PlayerSummary, RunLimits, RunSummary, VerifyReport};
pub use scenario::{Scenario, ScenarioError};
