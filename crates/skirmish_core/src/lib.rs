//! # Skirmish Core
//!
//! Deterministic entity simulation for a small real-time strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Identical inputs produce identical [`World::state_hash`](world::World::state_hash)
//! values, which is what the determinism tests and the headless runner
//! check.
//!
//! ## Crate Structure
//!
//! - [`stats`] - Unit and building stat tables, production capabilities
//! - [`unit`] - Units: orders, movement, collision avoidance, attacks
//! - [`structure`] - Buildings: construction and production queues
//! - [`player`] - Resources and owned entities
//! - [`world`] - Players, terrain and the frame loop
//! - [`query`] - The read-only view entities tick against
//! - [`map`] - Tile walkability
//! - [`config`] - Tuning constants
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod map;
pub mod math;
pub mod player;
pub mod query;
pub mod stats;
pub mod structure;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{Effect, Hit, HitReport, Strike};
    pub use crate::components::{EntityId, Order, PlayerId, Pool};
    pub use crate::config::SimConfig;
    pub use crate::economy::{Cost, Resources};
    pub use crate::error::{GameError, Result};
    pub use crate::map::TileMap;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::Player;
    pub use crate::query::{Arena, Body, Contact, ContactSheet, SnapshotView, WorldQuery};
    pub use crate::stats::{BuildingKind, Race, SpecialAbility, UnitKind};
    pub use crate::structure::Structure;
    pub use crate::unit::Unit;
    pub use crate::world::{TickEvents, World};
}
