//! Players: resources and owned entities.
//!
//! A player pays for everything it creates. Every paid operation checks
//! affordability and validity before touching any state, so a failed
//! request has no effect at all.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::combat::{Effect, Hit, HitReport};
use crate::components::{EntityId, PlayerId};
use crate::economy::{Cost, Resources};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::query::{Arena, Contact};
use crate::stats::{BuildingKind, Race, UnitKind};
use crate::structure::Structure;
use crate::unit::Unit;

/// What happened during one player's tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTickReport {
    /// Applied hits, in delivery order.
    pub hits: Vec<HitReport>,
    /// Entities of this player pruned after dying.
    pub removed: Vec<EntityId>,
    /// Units produced by this player's structures.
    pub spawned: Vec<EntityId>,
    /// Structures that finished construction.
    pub constructed: Vec<EntityId>,
}

/// A player with a race, a stockpile and owned entities.
///
/// Entities are kept in id order, which is also the order they are
/// ticked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    race: Race,
    resources: Resources,
    units: BTreeMap<EntityId, Unit>,
    structures: BTreeMap<EntityId, Structure>,
    next_serial: u32,
}

impl Player {
    /// Create a player with no entities.
    #[must_use]
    pub fn new(id: PlayerId, race: Race, resources: Resources) -> Self {
        Self {
            id,
            race,
            resources,
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
            next_serial: 0,
        }
    }

    /// Player id.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Player race.
    #[must_use]
    pub const fn race(&self) -> Race {
        self.race
    }

    /// Current stockpile.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Owned units in id order. Units killed this tick are included until
    /// they are pruned.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values()
    }

    /// Owned structures in id order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> + '_ {
        self.structures.values()
    }

    /// Look up an owned unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up an owned unit mutably.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Look up an owned structure.
    #[must_use]
    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Look up an owned structure mutably.
    pub fn structure_mut(&mut self, id: EntityId) -> Option<&mut Structure> {
        self.structures.get_mut(&id)
    }

    /// Number of living units.
    #[must_use]
    pub fn live_unit_count(&self) -> usize {
        self.units.values().filter(|u| u.is_alive()).count()
    }

    /// Number of living structures.
    #[must_use]
    pub fn live_structure_count(&self) -> usize {
        self.structures.values().filter(|s| s.is_alive()).count()
    }

    /// A player with nothing left alive is defeated.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.live_unit_count() == 0 && self.live_structure_count() == 0
    }

    /// Check if the stockpile covers a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.resources.can_afford(cost)
    }

    /// Pay a cost. Fails without deducting anything if it is not affordable.
    pub fn spend(&mut self, cost: Cost) -> Result<()> {
        if self.resources.spend(cost) {
            Ok(())
        } else {
            Err(GameError::InsufficientResources {
                required: cost,
                available: self.resources,
            })
        }
    }

    /// Add income.
    pub fn add_resources(&mut self, minerals: u32, gas: u32) {
        self.resources.deposit(minerals, gas);
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.id, self.next_serial);
        self.next_serial += 1;
        id
    }

    /// Register a unit without paying for it.
    pub fn spawn_unit(&mut self, kind: UnitKind, position: Vec2Fixed) -> EntityId {
        let id = self.allocate_id();
        self.units.insert(id, Unit::new(id, kind, position));
        id
    }

    /// Register a structure without paying for it.
    pub fn spawn_structure(&mut self, kind: BuildingKind, position: Vec2Fixed, constructed: bool) -> EntityId {
        let id = self.allocate_id();
        let structure = if constructed {
            Structure::constructed(id, kind, position)
        } else {
            Structure::new(id, kind, position)
        };
        self.structures.insert(id, structure);
        id
    }

    /// Buy a unit and place it immediately.
    pub fn create_unit(&mut self, kind: UnitKind, position: Vec2Fixed) -> Result<EntityId> {
        self.spend(kind.stats().cost)?;
        Ok(self.spawn_unit(kind, position))
    }

    /// Buy a building of this player's race. It starts unconstructed.
    pub fn create_building(&mut self, kind: BuildingKind, position: Vec2Fixed) -> Result<EntityId> {
        let stats = kind.stats();
        if stats.race != self.race {
            return Err(GameError::RaceMismatch {
                race: self.race,
                building: kind,
            });
        }
        self.spend(stats.cost)?;
        Ok(self.spawn_structure(kind, position, false))
    }

    /// Buy a unit and append it to a structure's production queue.
    pub fn queue_unit(&mut self, structure: EntityId, unit: UnitKind) -> Result<()> {
        let building = self
            .structures
            .get(&structure)
            .filter(|s| s.is_alive())
            .ok_or(GameError::EntityNotFound(structure))?;
        if !building.can_produce(unit) {
            return Err(GameError::InvalidProductionRequest {
                building: building.kind(),
                unit,
            });
        }

        self.spend(unit.stats().cost)?;
        if let Some(building) = self.structures.get_mut(&structure) {
            building.enqueue(unit);
        }
        Ok(())
    }

    /// Apply a hit to one of this player's entities.
    ///
    /// Returns `None` if the target is unknown or already dead, or if a
    /// heal targets a structure.
    pub fn apply_hit(&mut self, hit: &Hit) -> Option<HitReport> {
        let mut report = HitReport {
            hit: *hit,
            absorbed: Fixed::ZERO,
            health_lost: Fixed::ZERO,
            healed: Fixed::ZERO,
            killed: false,
        };

        match hit.effect {
            Effect::Damage(amount) => {
                if let Some(unit) = self.units.get_mut(&hit.target).filter(|u| u.is_alive()) {
                    (report.absorbed, report.health_lost) = unit.receive_damage(amount);
                    report.killed = !unit.is_alive();
                } else if let Some(structure) =
                    self.structures.get_mut(&hit.target).filter(|s| s.is_alive())
                {
                    (report.absorbed, report.health_lost) = structure.receive_damage(amount);
                    report.killed = !structure.is_alive();
                } else {
                    return None;
                }
            }
            Effect::Heal(amount) => {
                let unit = self.units.get_mut(&hit.target).filter(|u| u.is_alive())?;
                report.healed = unit.heal(amount);
            }
        }

        Some(report)
    }

    /// Drop every dead unit and structure, returning their ids.
    pub fn remove_dead(&mut self) -> Vec<EntityId> {
        let mut removed: Vec<EntityId> = Vec::new();

        self.units.retain(|id, unit| {
            let alive = unit.is_alive();
            if !alive {
                debug!(unit = %id, kind = ?unit.kind(), "unit destroyed");
                removed.push(*id);
            }
            alive
        });
        self.structures.retain(|id, structure| {
            let alive = structure.is_alive();
            if !alive {
                debug!(structure = %id, kind = ?structure.kind(), "structure destroyed");
                removed.push(*id);
            }
            alive
        });

        removed
    }

    /// Advance every owned entity by one frame.
    ///
    /// Units act first, in id order, each delivering its strike before the
    /// next unit moves. Dead units are pruned, then structures advance and
    /// their finished units are placed, then dead structures are pruned.
    pub fn tick<A: Arena + ?Sized>(&mut self, arena: &mut A) -> PlayerTickReport {
        let config = arena.config().clone();
        let mut report = PlayerTickReport::default();

        let ids: Vec<EntityId> = self.units.keys().copied().collect();
        for id in ids {
            let Some(unit) = self.units.get_mut(&id) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }

            let strike = unit.tick(&*arena);
            arena.record_position(id, unit.position());

            let Some(strike) = strike else {
                continue;
            };
            let Some(target_position) = arena.contact(strike.target).map(|c| c.position) else {
                continue;
            };

            for hit in strike.hits(target_position, arena.contacts(), &config) {
                let outcome = if hit.target.player == self.id {
                    let outcome = self.apply_hit(&hit);
                    if outcome.is_some_and(|r| r.killed) {
                        arena.record_death(hit.target);
                    }
                    outcome
                } else {
                    arena.deliver(&hit)
                };

                if let Some(outcome) = outcome {
                    trace!(
                        source = %hit.source,
                        target = %hit.target,
                        effect = ?hit.effect,
                        killed = outcome.killed,
                        "hit"
                    );
                    report.hits.push(outcome);
                }
            }
        }

        report.removed.extend(self.remove_dead());

        let mut produced = Vec::new();
        for structure in self.structures.values_mut() {
            if !structure.is_alive() {
                continue;
            }
            let was_constructed = structure.is_constructed();
            if let Some(kind) = structure.tick(&config) {
                let flying = kind.stats().ability.capabilities().flying;
                match structure.find_spawn_point(flying, &*arena) {
                    Some(position) => produced.push((structure.id(), kind, position)),
                    None => {
                        debug!(structure = %structure.id(), ?kind, "no room to spawn, holding");
                        structure.hold(kind, &config);
                    }
                }
            }
            if !was_constructed && structure.is_constructed() {
                debug!(structure = %structure.id(), kind = ?structure.kind(), "construction complete");
                report.constructed.push(structure.id());
            }
        }

        for (source, kind, position) in produced {
            let id = self.spawn_unit(kind, position);
            if let Some(unit) = self.units.get(&id) {
                arena.record_spawn(Contact::of_unit(unit));
            }
            debug!(unit = %id, ?kind, structure = %source, "unit produced");
            report.spawned.push(id);
        }

        report.removed.extend(self.remove_dead());
        report
    }
}
