//! Scenario loading and world setup.
//!
//! Scenarios describe a starting position in RON: the map, optional
//! simulation constants, each player's race, balance, units and buildings,
//! and the orders to hand out before the first tick. Orders refer to units
//! by their index in the owning player's `units` list.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use std::result::Result;

use skirmish_core::prelude::*;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// The simulation rejected part of the setup.
    #[error("Invalid scenario setup: {0}")]
    Game(#[from] GameError),
    /// An order refers to a player or unit the scenario does not define.
    #[error("Order {index} refers to {what}, which the scenario does not define")]
    UnknownReference {
        /// Position of the order in the scenario.
        index: usize,
        /// What could not be resolved.
        what: String,
    },
    /// The map and the config disagree on the tile size.
    #[error("Map tile size {map} does not match config tile size {config}")]
    TileSizeMismatch {
        /// Tile size given in the map section.
        map: u32,
        /// Tile size given in the config section.
        config: u32,
    },
}

/// Map layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSetup {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tile edge length in world units. Overrides the config's value when
    /// the config is omitted, and must match it otherwise.
    #[serde(default)]
    pub tile_size: Option<u32>,
    /// Seed for obstacle scatter.
    #[serde(default)]
    pub seed: u64,
    /// Share of tiles blocked by scatter, in percent. Zero gives an open map.
    #[serde(default)]
    pub obstacle_percent: u32,
}

/// A unit placed at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit kind.
    pub kind: UnitKind,
    /// X in world units.
    pub x: i32,
    /// Y in world units.
    pub y: i32,
}

/// A building placed at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Building kind.
    pub kind: BuildingKind,
    /// X of the footprint origin in world units.
    pub x: i32,
    /// Y of the footprint origin in world units.
    pub y: i32,
    /// Start fully built instead of under construction.
    #[serde(default = "default_constructed")]
    pub constructed: bool,
    /// Units bought into the production queue, front first.
    #[serde(default)]
    pub queue: Vec<UnitKind>,
}

fn default_constructed() -> bool {
    true
}

/// One player's starting position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Race.
    pub race: Race,
    /// Minerals on top of the configured starting balance.
    #[serde(default)]
    pub minerals: u32,
    /// Gas on top of the configured starting balance.
    #[serde(default)]
    pub gas: u32,
    /// Starting units. Orders index into this list.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Starting buildings.
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
}

/// An order handed out before the first tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioOrder {
    /// Move a unit to a world position.
    Move {
        /// Player index.
        player: usize,
        /// Unit index within that player's units.
        unit: usize,
        /// Destination x.
        x: i32,
        /// Destination y.
        y: i32,
    },
    /// Attack another player's unit.
    Attack {
        /// Player index.
        player: usize,
        /// Unit index within that player's units.
        unit: usize,
        /// Target player index.
        target_player: usize,
        /// Target unit index within the target player's units.
        target_unit: usize,
    },
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    #[serde(default)]
    pub name: String,
    /// Map layout.
    pub map: MapSetup,
    /// Simulation constants. Missing fields keep their defaults.
    #[serde(default)]
    pub config: Option<SimConfig>,
    /// Players, in registration order.
    pub players: Vec<PlayerSetup>,
    /// Orders issued after placement.
    #[serde(default)]
    pub orders: Vec<ScenarioOrder>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(ron)?)
    }

    /// Build the starting world.
    ///
    /// On scattered maps the tiles under and around every placement are
    /// opened first, so a seed never buries a starting unit.
    pub fn build(&self) -> Result<World, ScenarioError> {
        let config = self.resolve_config()?;
        config.validate()?;

        let mut world = World::new(self.build_map(config.tile_size), config);
        let mut unit_ids: Vec<Vec<EntityId>> = Vec::with_capacity(self.players.len());

        for setup in &self.players {
            let player = world.add_player(setup.race)?;
            world.add_resources(player, setup.minerals, setup.gas)?;

            let mut units = Vec::with_capacity(setup.units.len());
            for placement in &setup.units {
                let position = Vec2Fixed::from_ints(placement.x, placement.y);
                units.push(world.spawn_unit(player, placement.kind, position)?);
            }

            for placement in &setup.buildings {
                let position = Vec2Fixed::from_ints(placement.x, placement.y);
                let structure =
                    world.spawn_structure(player, placement.kind, position, placement.constructed)?;
                for kind in &placement.queue {
                    world.queue_unit(structure, *kind)?;
                }
            }

            debug!(
                %player,
                units = units.len(),
                buildings = setup.buildings.len(),
                "player placed"
            );
            unit_ids.push(units);
        }

        for (index, order) in self.orders.iter().enumerate() {
            let lookup = |player: usize, unit: usize| {
                unit_ids
                    .get(player)
                    .and_then(|units| units.get(unit))
                    .copied()
                    .ok_or_else(|| ScenarioError::UnknownReference {
                        index,
                        what: format!("unit {unit} of player {player}"),
                    })
            };

            match *order {
                ScenarioOrder::Move { player, unit, x, y } => {
                    world.issue_move(lookup(player, unit)?, Vec2Fixed::from_ints(x, y))?;
                }
                ScenarioOrder::Attack {
                    player,
                    unit,
                    target_player,
                    target_unit,
                } => {
                    let attacker = lookup(player, unit)?;
                    let target = lookup(target_player, target_unit)?;
                    world.issue_attack(attacker, target)?;
                }
            }
        }

        Ok(world)
    }

    /// Simulation constants with the map's tile size folded in.
    fn resolve_config(&self) -> Result<SimConfig, ScenarioError> {
        let mut config = self.config.clone().unwrap_or_default();
        match (self.map.tile_size, self.config.as_ref()) {
            (Some(map), Some(given)) if map != given.tile_size => {
                return Err(ScenarioError::TileSizeMismatch {
                    map,
                    config: given.tile_size,
                });
            }
            (Some(map), _) => config.tile_size = map,
            (None, _) => {}
        }
        Ok(config)
    }

    fn build_map(&self, tile_size: u32) -> TileMap {
        let MapSetup {
            width,
            height,
            seed,
            obstacle_percent,
            ..
        } = self.map;

        if obstacle_percent == 0 {
            return TileMap::open(width, height, tile_size);
        }

        let mut map = TileMap::scattered(width, height, tile_size, seed, obstacle_percent);
        for setup in &self.players {
            for unit in &setup.units {
                map.clear_around(Vec2Fixed::from_ints(unit.x, unit.y), 1);
            }
            for building in &setup.buildings {
                let footprint = building.kind.stats().footprint;
                let reach = i32::try_from(footprint.width.max(footprint.height)).unwrap_or(i32::MAX);
                map.clear_around(Vec2Fixed::from_ints(building.x, building.y), reach + 1);
            }
        }
        map
    }
}
