//! Strikes, hits and their outcomes.
//!
//! A unit's tick produces at most one [`Strike`]. The owning player
//! expands it into [`Hit`]s (the primary target plus any splash victims)
//! and applies each hit to its target, collecting [`HitReport`]s.

use crate::components::EntityId;
use crate::config::SimConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::query::Contact;

/// What a hit does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Shields-first damage.
    Damage(u32),
    /// Health restoration, capped at max health.
    Heal(u32),
}

/// An attack a unit wants delivered this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    /// Attacking unit.
    pub attacker: EntityId,
    /// Primary target.
    pub target: EntityId,
    /// Effect on the primary target.
    pub effect: Effect,
    /// Whether nearby enemies of the attacker are hit as well.
    pub splash: bool,
}

/// A single effect applied to a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Originating unit.
    pub source: EntityId,
    /// Receiving entity.
    pub target: EntityId,
    /// Effect.
    pub effect: Effect,
}

/// Outcome of an applied hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReport {
    /// The applied hit.
    pub hit: Hit,
    /// Damage absorbed by shields.
    pub absorbed: Fixed,
    /// Health lost.
    pub health_lost: Fixed,
    /// Health restored.
    pub healed: Fixed,
    /// The hit brought the target's health to zero.
    pub killed: bool,
}

impl Strike {
    /// Expand into hits: the primary target first, then splash victims in
    /// contact order.
    ///
    /// Splash victims are live entities other than the primary target that
    /// belong to another player than the attacker and stand within the
    /// splash radius of the primary target.
    #[must_use]
    pub fn hits(&self, target_position: Vec2Fixed, contacts: &[Contact], config: &SimConfig) -> Vec<Hit> {
        let mut hits = vec![Hit {
            source: self.attacker,
            target: self.target,
            effect: self.effect,
        }];

        let Effect::Damage(damage) = self.effect else {
            return hits;
        };
        if !self.splash {
            return hits;
        }

        let splash = config.splash_damage(damage);
        if splash == 0 {
            return hits;
        }

        let radius = Fixed::from_num(config.splash_radius);
        let radius_sq = radius * radius;
        hits.extend(
            contacts
                .iter()
                .filter(|c| c.alive && c.id != self.target && c.id.player != self.attacker.player)
                .filter(|c| c.position.distance_squared(target_position) <= radius_sq)
                .map(|c| Hit {
                    source: self.attacker,
                    target: c.id,
                    effect: Effect::Damage(splash),
                }),
        );
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::query::Body;

    fn id(player: u8, serial: u32) -> EntityId {
        EntityId::new(PlayerId(player), serial)
    }

    fn contact(id: EntityId, x: i32, alive: bool) -> Contact {
        Contact {
            id,
            position: Vec2Fixed::from_ints(x, 0),
            body: Body::Ground,
            alive,
            footprint: None,
        }
    }

    #[test]
    fn test_plain_strike_is_single_hit() {
        let strike = Strike {
            attacker: id(0, 0),
            target: id(1, 0),
            effect: Effect::Damage(6),
            splash: false,
        };
        let contacts = [contact(id(1, 1), 5, true)];
        let hits = strike.hits(Vec2Fixed::ZERO, &contacts, &SimConfig::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, id(1, 0));
    }

    #[test]
    fn test_splash_hits_nearby_enemies_only() {
        let strike = Strike {
            attacker: id(0, 0),
            target: id(1, 0),
            effect: Effect::Damage(8),
            splash: true,
        };
        let contacts = [
            contact(id(0, 0), 0, true),  // attacker
            contact(id(0, 3), 10, true), // ally, spared
            contact(id(1, 0), 0, true),  // primary
            contact(id(1, 1), 32, true), // on the edge
            contact(id(1, 2), 33, true), // too far
            contact(id(2, 0), -20, true),
            contact(id(2, 1), 5, false), // corpse
        ];

        let hits = strike.hits(Vec2Fixed::ZERO, &contacts, &SimConfig::default());
        let targets: Vec<_> = hits.iter().map(|h| h.target).collect();
        assert_eq!(targets, vec![id(1, 0), id(1, 1), id(2, 0)]);
        assert_eq!(hits[0].effect, Effect::Damage(8));
        assert_eq!(hits[1].effect, Effect::Damage(4));
    }

    #[test]
    fn test_heals_never_splash() {
        let strike = Strike {
            attacker: id(0, 0),
            target: id(0, 1),
            effect: Effect::Heal(8),
            splash: true,
        };
        let contacts = [contact(id(1, 0), 1, true)];
        assert_eq!(strike.hits(Vec2Fixed::ZERO, &contacts, &SimConfig::default()).len(), 1);
    }
}
