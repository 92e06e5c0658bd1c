//! Mobile units.
//!
//! A unit owns its pools, its current order and its attack cooldown. One
//! call to [`Unit::tick`] is one logical frame:
//!
//! 1. the attack cooldown counts down,
//! 2. an attack order strikes, holds, chases or falls back to idle,
//! 3. a move order steps toward its goal,
//! 4. shields and energy regenerate.
//!
//! Steps avoid other units of the same layer: if the direct step would
//! crowd another unit, seven alternate headings are tried before the unit
//! gives up for this frame.

use crate::combat::{Effect, Strike};
use crate::components::{layered_damage, EntityId, Order, Pool};
use crate::config::SimConfig;
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed, FRAC_1_SQRT_2};
use crate::query::{Body, Contact, WorldQuery};
use crate::stats::{Capabilities, UnitKind, UnitStats};

const ONE: Fixed = Fixed::from_bits(1 << 32);
const NEG_FRAC_1_SQRT_2: Fixed = Fixed::from_bits(-3_037_000_500);

/// Alternate headings as `(cos, sin)`, tried in order when the direct step
/// is blocked: +45°, -45°, +90°, -90°, +135°, -135°, 180°.
const DEFLECT_TURNS: [(Fixed, Fixed); 7] = [
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (FRAC_1_SQRT_2, NEG_FRAC_1_SQRT_2),
    (Fixed::ZERO, ONE),
    (Fixed::ZERO, Fixed::from_bits(-(1 << 32))),
    (NEG_FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (NEG_FRAC_1_SQRT_2, NEG_FRAC_1_SQRT_2),
    (Fixed::from_bits(-(1 << 32)), Fixed::ZERO),
];

/// Slack on the attack range check, absorbing rounding of chase steps
/// that end exactly on the range boundary.
const RANGE_TOLERANCE: Fixed = Fixed::from_bits(1 << 22);

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: EntityId,
    kind: UnitKind,
    stats: UnitStats,
    capabilities: Capabilities,
    position: Vec2Fixed,
    health: Pool,
    shield: Option<Pool>,
    energy: Option<Pool>,
    order: Order,
    attack_cooldown: u32,
}

impl Unit {
    /// Create a unit with the stock stats of its kind. Pools start full.
    #[must_use]
    pub fn new(id: EntityId, kind: UnitKind, position: Vec2Fixed) -> Self {
        Self::with_stats(id, kind, kind.stats(), position)
    }

    /// Create a unit with custom stats.
    #[must_use]
    pub fn with_stats(id: EntityId, kind: UnitKind, stats: UnitStats, position: Vec2Fixed) -> Self {
        let capabilities = stats.ability.capabilities();
        Self {
            id,
            kind,
            stats,
            capabilities,
            position,
            health: Pool::full(stats.health),
            shield: capabilities.shields.then(|| Pool::full(stats.max_shield)),
            energy: capabilities.energy.then(|| Pool::full(stats.max_energy)),
            order: Order::Idle,
            attack_cooldown: 0,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Resolved stats.
    #[must_use]
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Resolved ability switches.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Pool {
        &self.health
    }

    /// Shield pool, for shielded kinds.
    #[must_use]
    pub const fn shield(&self) -> Option<&Pool> {
        self.shield.as_ref()
    }

    /// Mutable shield pool, for shielded kinds.
    pub fn shield_mut(&mut self) -> Option<&mut Pool> {
        self.shield.as_mut()
    }

    /// Energy pool, for caster kinds.
    #[must_use]
    pub const fn energy(&self) -> Option<&Pool> {
        self.energy.as_ref()
    }

    /// Mutable energy pool, for caster kinds.
    pub fn energy_mut(&mut self) -> Option<&mut Pool> {
        self.energy.as_mut()
    }

    /// Current order.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.order
    }

    /// Ticks until the next attack is allowed.
    #[must_use]
    pub const fn attack_cooldown(&self) -> u32 {
        self.attack_cooldown
    }

    /// Collision layer.
    #[must_use]
    pub const fn body(&self) -> Body {
        if self.capabilities.flying {
            Body::Air
        } else {
            Body::Ground
        }
    }

    /// Check if the unit still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    /// Health as a percentage.
    #[must_use]
    pub fn health_percentage(&self) -> u32 {
        self.health.percentage()
    }

    /// Shield as a percentage, for shielded kinds.
    #[must_use]
    pub fn shield_percentage(&self) -> Option<u32> {
        self.shield.as_ref().map(Pool::percentage)
    }

    /// Energy as a percentage, for caster kinds.
    #[must_use]
    pub fn energy_percentage(&self) -> Option<u32> {
        self.energy.as_ref().map(Pool::percentage)
    }

    /// Walk to a point. Replaces any attack order.
    pub fn issue_move(&mut self, goal: Vec2Fixed) {
        self.order = Order::MoveTo(goal);
    }

    /// Attack an entity. Replaces any move order.
    pub fn issue_attack(&mut self, target: EntityId) {
        self.order = Order::AttackTarget(target);
    }

    /// Drop the current order.
    pub fn stop(&mut self) {
        self.order = Order::Idle;
    }

    /// Take damage, shields first.
    ///
    /// Returns `(absorbed_by_shield, lost_from_health)`.
    pub fn receive_damage(&mut self, amount: u32) -> (Fixed, Fixed) {
        layered_damage(self.shield.as_mut(), &mut self.health, amount)
    }

    /// Restore health up to max. Dead units cannot be healed.
    ///
    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> Fixed {
        if !self.is_alive() {
            return Fixed::ZERO;
        }
        self.health.fill(Fixed::from_num(amount))
    }

    /// Advance one frame. Returns the strike this unit makes, if any.
    pub fn tick<Q: WorldQuery + ?Sized>(&mut self, world: &Q) -> Option<Strike> {
        if !self.is_alive() {
            return None;
        }

        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);

        let strike = match self.order {
            Order::Idle => None,
            Order::AttackTarget(target) => self.pursue(target, world),
            Order::MoveTo(goal) => {
                self.advance(goal, world);
                None
            }
        };

        self.regenerate(world.config());
        strike
    }

    fn pursue<Q: WorldQuery + ?Sized>(&mut self, target: EntityId, world: &Q) -> Option<Strike> {
        let Some(contact) = world
            .contact(target)
            .filter(|c| c.alive && c.id != self.id)
            .copied()
        else {
            self.order = Order::Idle;
            return None;
        };

        let config = world.config();
        let range = config.range_in_world(self.stats.range);
        let reach = range + RANGE_TOLERANCE;
        let aim = contact.nearest_point(self.position, config.tile_size);
        let dist_sq = self.position.distance_squared(aim);

        if dist_sq <= reach * reach {
            if self.attack_cooldown > 0 {
                return None;
            }
            let effect = self.effect_on(&contact, config)?;
            self.attack_cooldown = config.attack_period_ticks;
            return Some(Strike {
                attacker: self.id,
                target,
                effect,
                splash: self.capabilities.splash,
            });
        }

        let distance = fixed_sqrt(dist_sq);
        let step = self.stats.speed.min(distance - range);
        self.step_toward(aim, distance, step, Some(target), world);
        None
    }

    /// Effect this unit has on a contact, if it can affect it at all.
    fn effect_on(&self, contact: &Contact, config: &SimConfig) -> Option<Effect> {
        if self.capabilities.heals {
            let friendly_unit =
                contact.id.player == self.id.player && contact.body != Body::Structure;
            return friendly_unit.then_some(Effect::Heal(config.heal_amount));
        }
        (self.stats.damage > 0).then_some(Effect::Damage(self.stats.damage))
    }

    fn advance<Q: WorldQuery + ?Sized>(&mut self, goal: Vec2Fixed, world: &Q) {
        let distance = self.position.distance(goal);
        let speed = self.stats.speed;

        if distance <= speed {
            if self.try_move(goal, None, world) {
                self.order = Order::Idle;
                return;
            }
        } else if self.step_toward(goal, distance, speed, None, world) {
            return;
        }

        if distance <= world.config().separation_distance() {
            self.order = Order::Idle;
        }
    }

    /// Step `step` units toward `target`, deflecting around crowding.
    /// Returns `false` if every heading was blocked.
    fn step_toward<Q: WorldQuery + ?Sized>(
        &mut self,
        target: Vec2Fixed,
        distance: Fixed,
        step: Fixed,
        ignore: Option<EntityId>,
        world: &Q,
    ) -> bool {
        if step <= Fixed::ZERO || distance <= Fixed::ZERO {
            return false;
        }

        let direct = (target - self.position).normalize().scaled(step);

        if self.try_move(self.position + direct, ignore, world) {
            return true;
        }
        DEFLECT_TURNS
            .iter()
            .any(|&(cos, sin)| self.try_move(self.position + direct.rotated(cos, sin), ignore, world))
    }

    fn try_move<Q: WorldQuery + ?Sized>(
        &mut self,
        candidate: Vec2Fixed,
        ignore: Option<EntityId>,
        world: &Q,
    ) -> bool {
        if self.collides(candidate, ignore, world) {
            return false;
        }
        self.position = candidate;
        true
    }

    /// A candidate collides when it is unwalkable for this unit (off the
    /// map, for flyers), or when it is within the separation distance of
    /// another unit in the same layer and closer to it than the current
    /// position.
    fn collides<Q: WorldQuery + ?Sized>(
        &self,
        candidate: Vec2Fixed,
        ignore: Option<EntityId>,
        world: &Q,
    ) -> bool {
        let open = if self.capabilities.flying {
            world.is_on_map(candidate)
        } else {
            world.is_walkable(candidate)
        };
        if !open {
            return true;
        }

        let separation = world.config().separation_distance();
        let separation_sq = separation * separation;
        let body = self.body();

        world
            .contacts()
            .iter()
            .filter(|c| c.alive && c.body == body && c.id != self.id && Some(c.id) != ignore)
            .any(|c| {
                let after = candidate.distance_squared(c.position);
                after < separation_sq && after < self.position.distance_squared(c.position)
            })
    }

    fn regenerate(&mut self, config: &SimConfig) {
        if let Some(shield) = self.shield.as_mut() {
            shield.fill(config.shield_regen_per_tick);
        }
        if let Some(energy) = self.energy.as_mut() {
            energy.fill(config.energy_regen_per_tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::map::TileMap;
    use crate::math::tenths;
    use crate::query::{ContactSheet, SnapshotView};

    fn id(player: u8, serial: u32) -> EntityId {
        EntityId::new(PlayerId(player), serial)
    }

    fn at(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    struct Field {
        sheet: ContactSheet,
        map: TileMap,
        config: SimConfig,
    }

    impl Field {
        fn new() -> Self {
            Self {
                sheet: ContactSheet::new(),
                map: TileMap::open(64, 64, 32),
                config: SimConfig::default(),
            }
        }

        fn with(units: &[&Unit]) -> Self {
            let mut field = Self::new();
            for unit in units {
                field.sheet.insert(Contact::of_unit(unit));
            }
            field
        }

        fn view(&self) -> SnapshotView<'_> {
            SnapshotView::new(&self.sheet, &self.map, &self.config)
        }
    }

    #[test]
    fn test_pools_start_full() {
        let zealot = Unit::new(id(0, 0), UnitKind::Zealot, at(0, 0));
        assert_eq!(zealot.health().current(), Fixed::from_num(100));
        assert_eq!(zealot.shield().map(Pool::current), Some(Fixed::from_num(60)));
        assert!(zealot.energy().is_none());

        let templar = Unit::new(id(0, 1), UnitKind::HighTemplar, at(0, 0));
        assert!(templar.shield().is_none());
        assert_eq!(templar.energy_percentage(), Some(100));
    }

    #[test]
    fn test_shield_overflow_into_health() {
        let mut stats = UnitKind::Zealot.stats();
        stats.health = 40;
        let mut unit = Unit::with_stats(id(0, 0), UnitKind::Zealot, stats, at(0, 0));
        if let Some(shield) = unit.shield_mut() {
            shield.drain(Fixed::from_num(55));
        }

        unit.receive_damage(12);

        assert_eq!(unit.shield().map(Pool::current), Some(Fixed::ZERO));
        assert_eq!(unit.health().current(), Fixed::from_num(33));
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut unit = Unit::new(id(0, 0), UnitKind::Marine, at(0, 0));
        let (_, lost) = unit.receive_damage(1000);
        assert_eq!(lost, Fixed::from_num(40));
        assert_eq!(unit.health().current(), Fixed::ZERO);
        assert!(!unit.is_alive());
        assert_eq!(unit.heal(10), Fixed::ZERO);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut unit = Unit::new(id(0, 0), UnitKind::Marine, at(0, 0));
        unit.receive_damage(10);
        assert_eq!(unit.health().current(), Fixed::from_num(30));
        assert_eq!(unit.heal(50), Fixed::from_num(10));
        assert_eq!(unit.health().current(), Fixed::from_num(40));
    }

    #[test]
    fn test_move_snaps_onto_goal() {
        let mut stats = UnitKind::Marine.stats();
        stats.speed = Fixed::from_num(3);
        let mut unit = Unit::with_stats(id(0, 0), UnitKind::Marine, stats, at(0, 0));
        let field = Field::new();
        unit.issue_move(at(10, 0));

        for expected in [3, 6, 9] {
            unit.tick(&field.view());
            assert_eq!(unit.position(), at(expected, 0));
            assert_eq!(unit.order(), Order::MoveTo(at(10, 0)));
        }

        unit.tick(&field.view());
        assert_eq!(unit.position(), at(10, 0));
        assert_eq!(unit.order(), Order::Idle);
    }

    #[test]
    fn test_new_order_replaces_old() {
        let mut unit = Unit::new(id(0, 0), UnitKind::Marine, at(0, 0));
        unit.issue_attack(id(1, 0));
        unit.issue_move(at(50, 50));
        assert_eq!(unit.order(), Order::MoveTo(at(50, 50)));
        assert_eq!(unit.order().target(), None);

        unit.issue_attack(id(1, 0));
        assert_eq!(unit.order().destination(), None);

        unit.stop();
        assert_eq!(unit.order(), Order::Idle);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut marine = Unit::new(id(0, 0), UnitKind::Marine, at(0, 0));
        let target = Unit::new(id(1, 0), UnitKind::Zergling, at(100, 0));
        let field = Field::with(&[&marine, &target]);
        marine.issue_attack(target.id());

        let strike_ticks: Vec<u32> = (1..=61)
            .filter(|_| marine.tick(&field.view()).is_some())
            .collect();

        assert_eq!(strike_ticks, vec![1, 31, 61]);
        assert_eq!(marine.position(), at(0, 0));
    }

    #[test]
    fn test_strike_contents() {
        let mut firebat = Unit::new(id(0, 0), UnitKind::Firebat, at(0, 0));
        let target = Unit::new(id(1, 0), UnitKind::Zergling, at(40, 0));
        let field = Field::with(&[&firebat, &target]);
        firebat.issue_attack(target.id());

        let strike = firebat.tick(&field.view());
        assert_eq!(
            strike,
            Some(Strike {
                attacker: firebat.id(),
                target: target.id(),
                effect: Effect::Damage(8),
                splash: true,
            })
        );
        assert_eq!(firebat.attack_cooldown(), 30);
    }

    #[test]
    fn test_stale_or_self_target_goes_idle() {
        let mut marine = Unit::new(id(0, 0), UnitKind::Marine, at(0, 0));
        let mut corpse = Unit::new(id(1, 0), UnitKind::Zergling, at(50, 0));
        corpse.receive_damage(100);
        let field = Field::with(&[&marine, &corpse]);

        marine.issue_attack(corpse.id());
        assert_eq!(marine.tick(&field.view()), None);
        assert_eq!(marine.order(), Order::Idle);

        marine.issue_attack(id(1, 99));
        assert_eq!(marine.tick(&field.view()), None);
        assert_eq!(marine.order(), Order::Idle);

        marine.issue_attack(marine.id());
        assert_eq!(marine.tick(&field.view()), None);
        assert_eq!(marine.order(), Order::Idle);
    }

    #[test]
    fn test_chase_stops_at_range_boundary() {
        let mut zergling = Unit::new(id(0, 0), UnitKind::Zergling, at(0, 0));
        let target = Unit::new(id(1, 0), UnitKind::Marine, at(100, 0));
        let field = Field::with(&[&zergling, &target]);
        zergling.issue_attack(target.id());

        let range = Fixed::from_num(32);
        let mut first_strike = None;
        for tick in 1..=40 {
            let strike = zergling.tick(&field.view());
            let distance = zergling.position().distance(target.position());
            assert!(distance + RANGE_TOLERANCE >= range, "overshot on tick {tick}");
            if strike.is_some() && first_strike.is_none() {
                first_strike = Some(tick);
            }
        }

        // 68 units to close at 3.5 per tick
        assert_eq!(first_strike, Some(21));
    }

    #[test]
    fn test_medic_heals_friends_only() {
        let mut medic = Unit::new(id(0, 0), UnitKind::Medic, at(0, 0));
        let friend = Unit::new(id(0, 1), UnitKind::Marine, at(40, 0));
        let enemy = Unit::new(id(1, 0), UnitKind::Marine, at(0, 40));
        let field = Field::with(&[&medic, &friend, &enemy]);

        medic.issue_attack(friend.id());
        let strike = medic.tick(&field.view());
        assert_eq!(strike.map(|s| s.effect), Some(Effect::Heal(8)));

        let mut medic = Unit::new(id(0, 0), UnitKind::Medic, at(0, 0));
        medic.issue_attack(enemy.id());
        assert_eq!(medic.tick(&field.view()), None);
        assert_eq!(medic.order(), Order::AttackTarget(enemy.id()));
        assert_eq!(medic.attack_cooldown(), 0);
    }

    #[test]
    fn test_zero_damage_never_strikes() {
        let mut templar = Unit::new(id(0, 0), UnitKind::HighTemplar, at(0, 0));
        let enemy = Unit::new(id(1, 0), UnitKind::Marine, at(32, 0));
        let field = Field::with(&[&templar, &enemy]);
        templar.issue_attack(enemy.id());
        assert!((0..40).all(|_| templar.tick(&field.view()).is_none()));
    }

    #[test]
    fn test_shield_and_energy_regenerate() {
        let field = Field::new();
        let mut zealot = Unit::new(id(0, 0), UnitKind::Zealot, at(0, 0));
        zealot.receive_damage(10);
        for _ in 0..10 {
            zealot.tick(&field.view());
        }
        let expected = Fixed::from_num(50) + tenths(1) * Fixed::from_num(10);
        assert_eq!(zealot.shield().map(Pool::current), Some(expected));
        assert_eq!(zealot.health().current(), Fixed::from_num(100));

        let mut ghost = Unit::new(id(0, 1), UnitKind::Ghost, at(0, 0));
        if let Some(energy) = ghost.energy_mut() {
            energy.drain(Fixed::from_num(1));
        }
        ghost.tick(&field.view());
        let energy = ghost.energy().map(Pool::current).unwrap_or_default();
        assert_eq!(energy, Fixed::from_num(199) + tenths(1));
    }

    #[test]
    fn test_deflects_around_stationary_unit() {
        let mut mover = Unit::new(id(0, 0), UnitKind::Marine, at(100, 100));
        let blocker = Unit::new(id(1, 0), UnitKind::Marine, at(140, 100));
        let field = Field::with(&[&mover, &blocker]);
        mover.issue_move(at(300, 100));

        let separation = Fixed::from_num(32);
        for _ in 0..120 {
            mover.tick(&field.view());
            assert!(mover.position().distance(blocker.position()) >= separation);
        }
        assert!(mover.position().x > Fixed::from_num(140));
    }

    #[test]
    fn test_blocked_near_goal_clears_order() {
        let mut mover = Unit::new(id(0, 0), UnitKind::Marine, at(100, 100));
        let squatter = Unit::new(id(1, 0), UnitKind::Marine, at(102, 100));
        let field = Field::with(&[&mover, &squatter]);
        mover.issue_move(at(102, 100));

        mover.tick(&field.view());
        assert_eq!(mover.order(), Order::Idle);
        assert_eq!(mover.position(), at(100, 100));
    }

    #[test]
    fn test_terrain_blocks_ground_but_not_air() {
        let mut field = Field::new();
        for y in 0..64 {
            field.map.set_blocked(4, y, true);
        }

        let mut marine = Unit::new(id(0, 0), UnitKind::Marine, at(120, 100));
        marine.issue_move(at(200, 100));
        for _ in 0..40 {
            marine.tick(&field.view());
        }
        assert!(marine.position().x < Fixed::from_num(128));

        let mut mutalisk = Unit::new(id(0, 1), UnitKind::Mutalisk, at(120, 100));
        mutalisk.issue_move(at(200, 100));
        for _ in 0..40 {
            mutalisk.tick(&field.view());
        }
        assert_eq!(mutalisk.position(), at(200, 100));
    }

    #[test]
    fn test_flyers_ignore_ground_units() {
        let mut mutalisk = Unit::new(id(0, 0), UnitKind::Mutalisk, at(100, 100));
        let marine = Unit::new(id(1, 0), UnitKind::Marine, at(120, 100));
        let field = Field::with(&[&mutalisk, &marine]);
        mutalisk.issue_move(at(140, 100));

        mutalisk.tick(&field.view());
        assert_eq!(mutalisk.position(), at(104, 100));
    }

    #[test]
    fn test_diagonal_step_has_unit_speed() {
        let mut stats = UnitKind::Marine.stats();
        stats.speed = Fixed::from_num(5);
        let mut unit = Unit::with_stats(id(0, 0), UnitKind::Marine, stats, at(100, 100));
        let field = Field::new();
        unit.issue_move(at(400, 500));

        unit.tick(&field.view());
        // 3-4-5 heading, up to rounding of the unit vector
        let off = unit.position() - at(103, 104);
        let slack = Fixed::from_bits(16);
        assert!(off.x.abs() <= slack && off.y.abs() <= slack, "{off:?}");
    }

    #[test]
    fn test_flyers_do_not_leave_the_map() {
        let field = Field::new();
        let mut mutalisk = Unit::new(id(0, 0), UnitKind::Mutalisk, at(2040, 100));
        mutalisk.issue_move(at(2100, 100));

        for _ in 0..30 {
            mutalisk.tick(&field.view());
            assert!(field.map.contains(mutalisk.position()));
        }
        assert!(mutalisk.position().x > Fixed::from_num(2040));
    }

    #[test]
    fn test_attacks_structure_from_its_near_side() {
        let barracks = crate::structure::Structure::constructed(
            id(1, 0),
            crate::stats::BuildingKind::Barracks,
            at(100, 100),
        );
        let mut field = Field::new();
        field.sheet.insert(Contact::of_structure(&barracks));

        // footprint spans x 100..196, so this zergling is already in reach
        let mut zergling = Unit::new(id(0, 0), UnitKind::Zergling, at(220, 150));
        field.sheet.insert(Contact::of_unit(&zergling));
        zergling.issue_attack(barracks.id());

        let strike = zergling.tick(&field.view());
        assert!(strike.is_some());
        assert_eq!(zergling.position(), at(220, 150));
    }
}
