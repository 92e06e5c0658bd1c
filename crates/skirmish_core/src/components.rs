//! Shared entity building blocks: identifiers, resource pools and orders.
//!
//! These are plain data with small invariant-keeping methods. Units and
//! structures are assembled from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Index of a player in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Position of the player in the world's registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Unique identifier for units and structures.
///
/// Serials are allocated by the owning player, so two entities are the
/// same entity exactly when their ids are equal. Ordering is by player,
/// then serial, which is the order the simulation visits entities in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// Owning player.
    pub player: PlayerId,
    /// Per-player serial.
    pub serial: u32,
}

impl EntityId {
    /// Create an id.
    #[must_use]
    pub const fn new(player: PlayerId, serial: u32) -> Self {
        Self { player, serial }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.player, self.serial)
    }
}

/// A bounded quantity: health, shields or energy.
///
/// `current` always stays within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    #[serde(with = "fixed_serde")]
    current: Fixed,
    #[serde(with = "fixed_serde")]
    max: Fixed,
}

impl Pool {
    /// Create a full pool.
    #[must_use]
    pub fn full(max: u32) -> Self {
        let max = Fixed::from_num(max);
        Self { current: max, max }
    }

    /// Create a pool at a given level, clamped into `[0, max]`.
    #[must_use]
    pub fn with_current(current: Fixed, max: u32) -> Self {
        let max = Fixed::from_num(max);
        Self {
            current: current.clamp(Fixed::ZERO, max),
            max,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn current(&self) -> Fixed {
        self.current
    }

    /// Capacity.
    #[must_use]
    pub const fn max(&self) -> Fixed {
        self.max
    }

    /// Check if the pool is exhausted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= Fixed::ZERO
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Remove up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: Fixed) -> Fixed {
        let actual = amount.clamp(Fixed::ZERO, self.current);
        self.current -= actual;
        actual
    }

    /// Add up to `amount`, returning how much was actually added.
    pub fn fill(&mut self, amount: Fixed) -> Fixed {
        let headroom = self.max - self.current;
        let actual = amount.clamp(Fixed::ZERO, headroom);
        self.current += actual;
        actual
    }

    /// Level as a whole percentage (0-100), rounded down.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max <= Fixed::ZERO {
            return 0;
        }
        let ratio = self.current * Fixed::from_num(100) / self.max;
        u32::try_from(ratio.to_num::<i64>().clamp(0, 100)).unwrap_or(0)
    }
}

/// Apply damage to an optional shield layer and then to health.
///
/// Returns `(absorbed_by_shield, lost_from_health)`.
pub fn layered_damage(shield: Option<&mut Pool>, health: &mut Pool, amount: u32) -> (Fixed, Fixed) {
    let amount = Fixed::from_num(amount);
    let absorbed = match shield {
        Some(shield) => shield.drain(amount),
        None => Fixed::ZERO,
    };
    let lost = health.drain(amount - absorbed);
    (absorbed, lost)
}

/// What a unit is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Order {
    /// No order.
    #[default]
    Idle,
    /// Walk (or fly) to a point.
    MoveTo(Vec2Fixed),
    /// Chase and attack an entity.
    AttackTarget(EntityId),
}

impl Order {
    /// Movement goal, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec2Fixed> {
        match self {
            Self::MoveTo(goal) => Some(*goal),
            _ => None,
        }
    }

    /// Attack target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        match self {
            Self::AttackTarget(target) => Some(*target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tenths;

    #[test]
    fn test_pool_drain_floors_at_zero() {
        let mut pool = Pool::full(40);
        assert_eq!(pool.drain(Fixed::from_num(15)), Fixed::from_num(15));
        assert_eq!(pool.current(), Fixed::from_num(25));
        assert_eq!(pool.drain(Fixed::from_num(100)), Fixed::from_num(25));
        assert!(pool.is_empty());
        assert_eq!(pool.current(), Fixed::ZERO);
    }

    #[test]
    fn test_pool_fill_caps_at_max() {
        let mut pool = Pool::with_current(Fixed::from_num(30), 40);
        assert_eq!(pool.fill(Fixed::from_num(50)), Fixed::from_num(10));
        assert!(pool.is_full());
        assert_eq!(pool.current(), Fixed::from_num(40));
    }

    #[test]
    fn test_pool_with_current_clamps() {
        assert_eq!(
            Pool::with_current(Fixed::from_num(-5), 10).current(),
            Fixed::ZERO
        );
        assert_eq!(
            Pool::with_current(Fixed::from_num(50), 10).current(),
            Fixed::from_num(10)
        );
    }

    #[test]
    fn test_layered_damage_overflows_into_health() {
        let mut shield = Pool::with_current(Fixed::from_num(5), 60);
        let mut health = Pool::full(40);

        let (absorbed, lost) = layered_damage(Some(&mut shield), &mut health, 12);

        assert_eq!(absorbed, Fixed::from_num(5));
        assert_eq!(lost, Fixed::from_num(7));
        assert_eq!(shield.current(), Fixed::ZERO);
        assert_eq!(health.current(), Fixed::from_num(33));
    }

    #[test]
    fn test_layered_damage_without_shield() {
        let mut health = Pool::full(40);
        let (absorbed, lost) = layered_damage(None, &mut health, 6);
        assert_eq!(absorbed, Fixed::ZERO);
        assert_eq!(lost, Fixed::from_num(6));
    }

    #[test]
    fn test_percentage() {
        let mut pool = Pool::full(60);
        assert_eq!(pool.percentage(), 100);
        pool.drain(Fixed::from_num(45));
        assert_eq!(pool.percentage(), 25);
        pool.fill(tenths(1));
        assert_eq!(pool.percentage(), 25);
        assert_eq!(Pool::full(0).percentage(), 0);
    }

    #[test]
    fn test_entity_id_display_and_order() {
        let a = EntityId::new(PlayerId(0), 7);
        let b = EntityId::new(PlayerId(1), 0);
        assert_eq!(a.to_string(), "P0#7");
        assert!(a < b);
    }

    #[test]
    fn test_order_accessors() {
        let goal = Vec2Fixed::from_ints(3, 4);
        assert_eq!(Order::MoveTo(goal).destination(), Some(goal));
        assert_eq!(Order::MoveTo(goal).target(), None);
        assert_eq!(Order::Idle.destination(), None);
    }
}
