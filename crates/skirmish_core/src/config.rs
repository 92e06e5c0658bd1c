//! Simulation tuning constants.
//!
//! Defaults reproduce the classic ruleset. Any subset of fields can be
//! overridden from RON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::economy::Resources;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, tenths, Fixed};

/// Tuning constants shared by every entity in a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Edge length of one map tile in world units. Attack ranges are in tiles.
    pub tile_size: u32,
    /// Ticks between two attacks of the same unit.
    pub attack_period_ticks: u32,
    /// Ticks a structure needs to produce one queued unit.
    pub production_cycle_ticks: u32,
    /// Offset from a structure's origin where produced units appear.
    pub spawn_offset: i32,
    /// Minimum distance units of the same layer keep from each other.
    pub separation: u32,
    /// Shield points regained per tick.
    #[serde(with = "fixed_serde")]
    pub shield_regen_per_tick: Fixed,
    /// Energy points regained per tick.
    #[serde(with = "fixed_serde")]
    pub energy_regen_per_tick: Fixed,
    /// Radius around the primary target hit by splash attacks.
    pub splash_radius: u32,
    /// Share of damage dealt to splash victims, in percent.
    pub splash_percent: u32,
    /// Health restored by one heal.
    pub heal_amount: u32,
    /// Balance of a newly registered player.
    pub starting_resources: Resources,
    /// Nominal tick rate, used only to report elapsed game time.
    pub ticks_per_second: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            attack_period_ticks: 30,
            production_cycle_ticks: 50,
            spawn_offset: 64,
            separation: 32,
            shield_regen_per_tick: tenths(1),
            energy_regen_per_tick: tenths(1),
            splash_radius: 32,
            splash_percent: 50,
            heal_amount: 8,
            starting_resources: Resources::new(50, 0),
            ticks_per_second: 60,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from RON text.
    ///
    /// `origin` names the source in error messages (usually a file path).
    pub fn from_ron_str(src: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(src).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break the simulation.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(GameError::InvalidState("tile_size must be positive".into()));
        }
        if self.production_cycle_ticks == 0 {
            return Err(GameError::InvalidState(
                "production_cycle_ticks must be positive".into(),
            ));
        }
        if self.splash_percent > 100 {
            return Err(GameError::InvalidState(
                "splash_percent must be at most 100".into(),
            ));
        }
        if self.shield_regen_per_tick < Fixed::ZERO || self.energy_regen_per_tick < Fixed::ZERO {
            return Err(GameError::InvalidState(
                "regeneration rates must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Attack range in world units for a range given in tiles.
    #[must_use]
    pub fn range_in_world(&self, tiles: u32) -> Fixed {
        Fixed::from_num(tiles) * Fixed::from_num(self.tile_size)
    }

    /// Separation distance as a fixed-point value.
    #[must_use]
    pub fn separation_distance(&self) -> Fixed {
        Fixed::from_num(self.separation)
    }

    /// Damage a splash victim takes from a strike of `damage`.
    #[must_use]
    pub fn splash_damage(&self, damage: u32) -> u32 {
        damage.saturating_mul(self.splash_percent) / 100
    }
}
