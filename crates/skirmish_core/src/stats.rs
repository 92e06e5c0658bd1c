//! Static stat tables for unit and building kinds.
//!
//! Pure lookup data. Special abilities are a closed enum, resolved once
//! into [`Capabilities`] when a unit is created, so the per-tick code
//! never branches on an ability tag.

use serde::{Deserialize, Serialize};

use crate::economy::Cost;
use crate::math::{tenths, Fixed};

/// Playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    /// Terran.
    Terran,
    /// Zerg.
    Zerg,
    /// Protoss.
    Protoss,
}

/// Special ability tag carried by a stat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpecialAbility {
    /// No special ability.
    #[default]
    None,
    /// Regenerating shield pool that absorbs damage before health.
    Shields,
    /// Psionic energy pool.
    PsionicEnergy,
    /// Cloaking energy pool.
    CloakEnergy,
    /// Airborne: ignores terrain and ground units.
    Flying,
    /// Attacks also hit enemies around the target.
    Splash,
    /// Attack orders on friendly units heal instead of damaging.
    Heal,
}

impl SpecialAbility {
    /// Resolve the tag into concrete behavior switches.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        Capabilities {
            shields: matches!(self, Self::Shields),
            energy: matches!(self, Self::PsionicEnergy | Self::CloakEnergy),
            flying: matches!(self, Self::Flying),
            splash: matches!(self, Self::Splash),
            heals: matches!(self, Self::Heal),
        }
    }
}

/// Behavior switches derived from a [`SpecialAbility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Has a shield pool.
    pub shields: bool,
    /// Has an energy pool.
    pub energy: bool,
    /// Moves in the air layer.
    pub flying: bool,
    /// Deals splash damage.
    pub splash: bool,
    /// Heals friendly units.
    pub heals: bool,
}

/// Unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Terran infantry.
    Marine,
    /// Terran flamethrower infantry.
    Firebat,
    /// Terran sniper.
    Ghost,
    /// Terran healer.
    Medic,
    /// Fast Zerg melee.
    Zergling,
    /// Zerg ranged.
    Hydralisk,
    /// Zerg flyer.
    Mutalisk,
    /// Protoss melee.
    Zealot,
    /// Protoss ranged walker.
    Dragoon,
    /// Protoss caster.
    HighTemplar,
}

/// Immutable stat record for a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Maximum health.
    pub health: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Movement in length units per tick.
    pub speed: Fixed,
    /// Attack range in tiles.
    pub range: u32,
    /// Production / creation price.
    pub cost: Cost,
    /// Nominal build time in ticks.
    pub build_time: u32,
    /// Special ability tag.
    pub ability: SpecialAbility,
    /// Shield capacity (0 when the kind has no shields).
    pub max_shield: u32,
    /// Energy capacity (0 when the kind has no energy).
    pub max_energy: u32,
}

impl UnitKind {
    /// Every unit kind, in table order.
    pub const ALL: [Self; 10] = [
        Self::Marine,
        Self::Firebat,
        Self::Ghost,
        Self::Medic,
        Self::Zergling,
        Self::Hydralisk,
        Self::Mutalisk,
        Self::Zealot,
        Self::Dragoon,
        Self::HighTemplar,
    ];

    /// Look up the stat record.
    #[must_use]
    pub fn stats(self) -> UnitStats {
        use SpecialAbility as A;

        // health, damage, speed (tenths), range, minerals, gas, build, ability, shield, energy
        let (health, damage, speed, range, minerals, gas, build_time, ability, shield, energy) =
            match self {
                Self::Marine => (40, 6, 25, 4, 50, 0, 24, A::None, 0, 0),
                Self::Firebat => (50, 8, 22, 2, 75, 25, 24, A::Splash, 0, 0),
                Self::Ghost => (45, 10, 28, 6, 100, 75, 32, A::CloakEnergy, 0, 200),
                Self::Medic => (60, 0, 25, 2, 75, 25, 30, A::Heal, 0, 0),
                Self::Zergling => (35, 5, 35, 1, 25, 0, 20, A::None, 0, 0),
                Self::Hydralisk => (80, 10, 23, 4, 75, 25, 28, A::None, 0, 0),
                Self::Mutalisk => (120, 9, 40, 3, 100, 100, 33, A::Flying, 0, 0),
                Self::Zealot => (100, 8, 27, 1, 100, 0, 27, A::Shields, 60, 0),
                Self::Dragoon => (100, 20, 24, 4, 125, 50, 35, A::Shields, 80, 0),
                Self::HighTemplar => (40, 0, 20, 6, 150, 150, 50, A::PsionicEnergy, 0, 200),
            };

        UnitStats {
            health,
            damage,
            speed: tenths(speed),
            range,
            cost: Cost::new(minerals, gas),
            build_time,
            ability,
            max_shield: shield,
            max_energy: energy,
        }
    }

    /// Race that fields this unit.
    #[must_use]
    pub const fn race(self) -> Race {
        match self {
            Self::Marine | Self::Firebat | Self::Ghost | Self::Medic => Race::Terran,
            Self::Zergling | Self::Hydralisk | Self::Mutalisk => Race::Zerg,
            Self::Zealot | Self::Dragoon | Self::HighTemplar => Race::Protoss,
        }
    }
}

/// Building kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Terran main base.
    CommandCenter,
    /// Terran infantry production.
    Barracks,
    /// Zerg main base and production.
    Hatchery,
    /// Protoss production.
    Gateway,
}

/// Building footprint in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
}

/// Immutable stat record for a building kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingStats {
    /// Maximum health.
    pub health: u32,
    /// Construction time in ticks.
    pub build_time: u32,
    /// Construction price.
    pub cost: Cost,
    /// Occupied tiles.
    pub footprint: Footprint,
    /// Race that can build it.
    pub race: Race,
    /// `None` or `Shields`.
    pub ability: SpecialAbility,
}

impl BuildingStats {
    /// Shield capacity: half of max health for shielded buildings.
    #[must_use]
    pub const fn max_shield(&self) -> u32 {
        match self.ability {
            SpecialAbility::Shields => self.health / 2,
            _ => 0,
        }
    }
}

impl BuildingKind {
    /// Every building kind, in table order.
    pub const ALL: [Self; 4] = [
        Self::CommandCenter,
        Self::Barracks,
        Self::Hatchery,
        Self::Gateway,
    ];

    /// Look up the stat record.
    #[must_use]
    pub const fn stats(self) -> BuildingStats {
        let (health, build_time, minerals, width, height, race, ability) = match self {
            Self::CommandCenter => (1500, 100, 400, 4, 3, Race::Terran, SpecialAbility::None),
            Self::Barracks => (1000, 65, 150, 3, 2, Race::Terran, SpecialAbility::None),
            Self::Hatchery => (1500, 100, 300, 4, 3, Race::Zerg, SpecialAbility::None),
            Self::Gateway => (1000, 65, 150, 3, 2, Race::Protoss, SpecialAbility::Shields),
        };

        BuildingStats {
            health,
            build_time,
            cost: Cost::new(minerals, 0),
            footprint: Footprint { width, height },
            race,
            ability,
        }
    }

    /// Unit kinds this building can produce.
    #[must_use]
    pub const fn produces(self) -> &'static [UnitKind] {
        match self {
            Self::CommandCenter => &[],
            Self::Barracks => &[
                UnitKind::Marine,
                UnitKind::Firebat,
                UnitKind::Ghost,
                UnitKind::Medic,
            ],
            Self::Hatchery => &[UnitKind::Zergling, UnitKind::Hydralisk, UnitKind::Mutalisk],
            Self::Gateway => &[UnitKind::Zealot, UnitKind::Dragoon, UnitKind::HighTemplar],
        }
    }

    /// Check if this building can produce a given unit kind.
    #[must_use]
    pub fn can_produce(self, unit: UnitKind) -> bool {
        self.produces().contains(&unit)
    }
}
