//! Error types for the game simulation.
//!
//! Every failure in the core is local: the operation that returns an
//! error leaves the simulation untouched.

use thiserror::Error;

use crate::components::{EntityId, PlayerId};
use crate::economy::{Cost, Resources};
use crate::stats::{BuildingKind, Race, UnitKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The player cannot pay for the requested action.
    #[error("Insufficient resources: need {required}, have {available}")]
    InsufficientResources {
        /// Cost of the rejected action.
        required: Cost,
        /// Balance at the time of the request.
        available: Resources,
    },

    /// A structure was asked to produce a unit it cannot build.
    #[error("{building:?} cannot produce {unit:?}")]
    InvalidProductionRequest {
        /// Kind of the producing structure.
        building: BuildingKind,
        /// Requested unit kind.
        unit: UnitKind,
    },

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid player reference.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// An attack order named the attacker itself or a non-attackable entity.
    #[error("Invalid attack target {target} for {attacker}")]
    InvalidTarget {
        /// Unit that received the order.
        attacker: EntityId,
        /// Rejected target.
        target: EntityId,
    },

    /// Destination or placement lies outside the map or on blocked terrain.
    #[error("Position ({x}, {y}) is not walkable")]
    Unwalkable {
        /// World x coordinate, truncated to whole units.
        x: i32,
        /// World y coordinate, truncated to whole units.
        y: i32,
    },

    /// Destination or placement lies outside the map. Checked for flyers,
    /// which ignore terrain but not the map edge.
    #[error("Position ({x}, {y}) is outside the map")]
    OutOfBounds {
        /// World x coordinate, truncated to whole units.
        x: i32,
        /// World y coordinate, truncated to whole units.
        y: i32,
    },

    /// A player tried to build a structure of another race.
    #[error("{race:?} cannot build {building:?}")]
    RaceMismatch {
        /// Race of the requesting player.
        race: Race,
        /// Requested building kind.
        building: BuildingKind,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },
}
