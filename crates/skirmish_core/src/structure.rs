//! Buildings: construction, production queues and damage.

use std::collections::VecDeque;

use crate::components::{layered_damage, EntityId, Pool};
use crate::config::SimConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::query::WorldQuery;
use crate::stats::{BuildingKind, BuildingStats, UnitKind};

/// Rings of tiles searched around the spawn point when it is blocked.
const SPAWN_SEARCH_RINGS: i32 = 3;

/// A building on the map.
///
/// `position` is the top-left corner of the footprint. Construction
/// advances one step per tick until it reaches the kind's build time.
/// Only then does the production queue start moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    id: EntityId,
    kind: BuildingKind,
    stats: BuildingStats,
    position: Vec2Fixed,
    construction_progress: u32,
    health: Pool,
    shield: Option<Pool>,
    queue: VecDeque<UnitKind>,
    production_progress: u32,
}

impl Structure {
    /// Create a structure that still has to be built.
    #[must_use]
    pub fn new(id: EntityId, kind: BuildingKind, position: Vec2Fixed) -> Self {
        let stats = kind.stats();
        let max_shield = stats.max_shield();
        Self {
            id,
            kind,
            stats,
            position,
            construction_progress: 0,
            health: Pool::full(stats.health),
            shield: (max_shield > 0).then(|| Pool::full(max_shield)),
            queue: VecDeque::new(),
            production_progress: 0,
        }
    }

    /// Create a structure that is already built.
    #[must_use]
    pub fn constructed(id: EntityId, kind: BuildingKind, position: Vec2Fixed) -> Self {
        let mut structure = Self::new(id, kind, position);
        structure.construction_progress = structure.stats.build_time;
        structure
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Building kind.
    #[must_use]
    pub const fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// Stat record.
    #[must_use]
    pub const fn stats(&self) -> &BuildingStats {
        &self.stats
    }

    /// Top-left corner of the footprint.
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

    /// Construction ticks completed.
    #[must_use]
    pub const fn construction_progress(&self) -> u32 {
        self.construction_progress
    }

    /// Ticks spent on the unit at the front of the queue.
    #[must_use]
    pub const fn production_progress(&self) -> u32 {
        self.production_progress
    }

    /// Queued unit kinds, front first.
    pub fn queue(&self) -> impl Iterator<Item = UnitKind> + '_ {
        self.queue.iter().copied()
    }

    /// Number of queued units.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Check if construction has finished.
    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        self.construction_progress >= self.stats.build_time
    }

    /// Check if the structure still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    /// Check if this structure's kind can produce a unit kind.
    #[must_use]
    pub fn can_produce(&self, unit: UnitKind) -> bool {
        self.kind.can_produce(unit)
    }

    /// Append a unit to the production queue.
    ///
    /// Returns `false`, leaving the queue untouched, if this kind of
    /// building cannot produce it.
    pub fn enqueue(&mut self, unit: UnitKind) -> bool {
        if !self.can_produce(unit) {
            return false;
        }
        self.queue.push_back(unit);
        true
    }

    /// Where produced units appear.
    #[must_use]
    pub fn spawn_position(&self, config: &SimConfig) -> Vec2Fixed {
        let offset = Fixed::from_num(config.spawn_offset);
        self.position + Vec2Fixed::new(offset, offset)
    }

    /// First open point for a produced unit, if any.
    ///
    /// Tries the spawn position, then rings of tile-sized offsets around
    /// it, row by row. Ground units need walkable terrain, flyers only the
    /// map.
    pub fn find_spawn_point<Q: WorldQuery + ?Sized>(&self, flying: bool, world: &Q) -> Option<Vec2Fixed> {
        let config = world.config();
        let origin = self.spawn_position(config);
        let tile = Fixed::from_num(config.tile_size);
        let open = |point: Vec2Fixed| {
            if flying {
                world.is_on_map(point)
            } else {
                world.is_walkable(point)
            }
        };

        if open(origin) {
            return Some(origin);
        }
        (1..=SPAWN_SEARCH_RINGS).find_map(|ring| {
            (-ring..=ring)
                .flat_map(|dy| (-ring..=ring).map(move |dx| (dx, dy)))
                .filter(|(dx, dy)| dx.abs() == ring || dy.abs() == ring)
                .map(|(dx, dy)| {
                    origin + Vec2Fixed::new(tile * Fixed::from_num(dx), tile * Fixed::from_num(dy))
                })
                .find(|&point| open(point))
        })
    }

    /// Put a finished unit back at the front of the queue, ready to pop
    /// again next tick.
    pub fn hold(&mut self, unit: UnitKind, config: &SimConfig) {
        self.queue.push_front(unit);
        self.production_progress = config.production_cycle_ticks.saturating_sub(1);
    }

    /// Construction progress as a percentage.
    #[must_use]
    pub fn construction_percentage(&self) -> u32 {
        if self.stats.build_time == 0 {
            return 100;
        }
        self.construction_progress.min(self.stats.build_time) * 100 / self.stats.build_time
    }

    /// Progress on the front of the queue as a percentage.
    #[must_use]
    pub fn production_percentage(&self, config: &SimConfig) -> u32 {
        let cycle = config.production_cycle_ticks.max(1);
        self.production_progress.min(cycle) * 100 / cycle
    }

    /// Take damage, shields first. Construction progress is unaffected.
    ///
    /// Returns `(absorbed_by_shield, lost_from_health)`.
    pub fn receive_damage(&mut self, amount: u32) -> (Fixed, Fixed) {
        layered_damage(self.shield.as_mut(), &mut self.health, amount)
    }

    /// Advance one frame. Returns a finished unit kind, if any.
    pub fn tick(&mut self, config: &SimConfig) -> Option<UnitKind> {
        if !self.is_alive() {
            return None;
        }

        if let Some(shield) = self.shield.as_mut() {
            shield.fill(config.shield_regen_per_tick);
        }

        if !self.is_constructed() {
            self.construction_progress += 1;
            return None;
        }

        if self.queue.is_empty() {
            return None;
        }

        self.production_progress += 1;
        if self.production_progress < config.production_cycle_ticks {
            return None;
        }
        self.production_progress = 0;
        self.queue.pop_front()
    }
}
