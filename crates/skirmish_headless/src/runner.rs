//! Running worlds to completion and summarising the outcome.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use std::result::Result;

use skirmish_core::prelude::*;

use crate::scenario::{Scenario, ScenarioError};

/// How long to run a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum number of ticks to simulate.
    pub max_ticks: u64,
    /// Stop as soon as one player is left standing.
    pub until_victory: bool,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_ticks: 3600,
            until_victory: false,
        }
    }
}

/// Final state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player index.
    pub player: u8,
    /// Race.
    pub race: Race,
    /// Minerals left.
    pub minerals: u32,
    /// Gas left.
    pub gas: u32,
    /// Surviving units.
    pub units: usize,
    /// Surviving structures.
    pub structures: usize,
    /// Whether the player has nothing left.
    pub defeated: bool,
}

/// Outcome of a headless run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Elapsed game time at the configured tick rate.
    pub game_seconds: u64,
    /// Last player standing, if any.
    pub winner: Option<u8>,
    /// Per-player results, in registration order.
    pub players: Vec<PlayerSummary>,
    /// Entities removed after dying.
    pub deaths: usize,
    /// Units produced by structures.
    pub spawns: usize,
    /// Structures that finished construction.
    pub constructions: usize,
    /// Hits delivered.
    pub hits: usize,
    /// Final state hash.
    pub final_hash: u64,
}

impl RunSummary {
    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Run a world until the limits are reached.
pub fn run_world(world: &mut World, name: &str, limits: RunLimits) -> RunSummary {
    let mut deaths = 0;
    let mut spawns = 0;
    let mut constructions = 0;
    let mut hits = 0;

    let start = world.current_tick();
    while world.current_tick() - start < limits.max_ticks {
        if limits.until_victory && world.winner().is_some() {
            break;
        }
        let events = world.tick();
        deaths += events.deaths.len();
        spawns += events.spawned.len();
        constructions += events.constructed.len();
        hits += events.hits.len();
    }

    let ticks = world.current_tick() - start;
    let winner = world.winner();
    if let Some(player) = winner {
        info!(%player, tick = world.current_tick(), "victory");
    }
    debug!(ticks, deaths, spawns, "run finished");

    let players = world
        .players()
        .iter()
        .map(|p| PlayerSummary {
            player: p.id().0,
            race: p.race(),
            minerals: p.resources().minerals,
            gas: p.resources().gas,
            units: p.live_unit_count(),
            structures: p.live_structure_count(),
            defeated: p.is_defeated(),
        })
        .collect();

    let per_second = u64::from(world.config().ticks_per_second.max(1));
    RunSummary {
        scenario: name.to_string(),
        ticks,
        game_seconds: world.current_tick() / per_second,
        winner: winner.map(|p| p.0),
        players,
        deaths,
        spawns,
        constructions,
        hits,
        final_hash: world.state_hash(),
    }
}

/// Build a scenario and run it.
pub fn run_scenario(scenario: &Scenario, limits: RunLimits) -> Result<RunSummary, ScenarioError> {
    let mut world = scenario.build()?;
    Ok(run_world(&mut world, &scenario.name, limits))
}

/// Result of running the same scenario several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Ticks simulated per run.
    pub ticks: u64,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// Whether every run ended in the same state.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run a scenario `runs` times for `ticks` ticks and collect the final hashes.
pub fn verify(scenario: &Scenario, ticks: u64, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let limits = RunLimits {
        max_ticks: ticks,
        until_victory: false,
    };
    let hashes = (0..runs)
        .map(|_| run_scenario(scenario, limits).map(|summary| summary.final_hash))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VerifyReport { ticks, hashes })
}
