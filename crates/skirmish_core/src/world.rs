//! The world: players, map and the frame loop.
//!
//! [`World::tick`] advances every player once, in registration order. Each
//! player's tick runs against a [`Battlefield`] that exposes the contact
//! sheet, the terrain and the other players' entities as hit targets.
//!
//! The contact sheet is captured at the start of the frame and updated as
//! units commit moves and die, so later movers see earlier movers' new
//! positions. This makes a frame order-dependent, but the order itself is
//! fixed (player, then entity id), so every run is reproducible.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::combat::{Hit, HitReport};
use crate::components::{EntityId, PlayerId, Pool};
use crate::config::SimConfig;
use crate::error::{GameError, Result};
use crate::map::TileMap;
use crate::math::Vec2Fixed;
use crate::player::Player;
use crate::query::{Arena, Contact, ContactSheet, WorldQuery};
use crate::stats::{BuildingKind, Race, UnitKind};
use crate::structure::Structure;
use crate::unit::Unit;

/// Everything that happened during one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Frame number after the tick.
    pub tick: u64,
    /// Applied hits, in delivery order.
    pub hits: Vec<HitReport>,
    /// Entities removed after dying.
    pub deaths: Vec<EntityId>,
    /// Units produced by structures.
    pub spawned: Vec<EntityId>,
    /// Structures that finished construction.
    pub constructed: Vec<EntityId>,
}

/// The whole simulation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    tick: u64,
    config: SimConfig,
    map: TileMap,
    players: Vec<Player>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(map: TileMap, config: SimConfig) -> Self {
        Self {
            tick: 0,
            config,
            map,
            players: Vec::new(),
        }
    }

    /// Register a player with the configured starting resources.
    pub fn add_player(&mut self, race: Race) -> Result<PlayerId> {
        let index = u8::try_from(self.players.len())
            .map_err(|_| GameError::InvalidState("player limit reached".into()))?;
        let id = PlayerId(index);
        self.players
            .push(Player::new(id, race, self.config.starting_resources));
        debug!(player = %id, ?race, "player joined");
        Ok(id)
    }

    /// Frames simulated so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation constants.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Terrain.
    #[must_use]
    pub const fn map(&self) -> &TileMap {
        &self.map
    }

    /// Players in registration order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(id.index())
            .ok_or(GameError::PlayerNotFound(id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(id.index())
            .ok_or(GameError::PlayerNotFound(id))
    }

    /// Every living unit of every player.
    pub fn all_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.players
            .iter()
            .flat_map(|p| p.units())
            .filter(|u| u.is_alive())
    }

    /// Every living structure of every player.
    pub fn all_structures(&self) -> impl Iterator<Item = &Structure> + '_ {
        self.players
            .iter()
            .flat_map(|p| p.structures())
            .filter(|s| s.is_alive())
    }

    /// Look up a living unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.players
            .get(id.player.index())?
            .unit(id)
            .filter(|u| u.is_alive())
    }

    /// Look up a living structure.
    #[must_use]
    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.players
            .get(id.player.index())?
            .structure(id)
            .filter(|s| s.is_alive())
    }

    fn unit_mut(&mut self, id: EntityId) -> Result<&mut Unit> {
        self.players
            .get_mut(id.player.index())
            .and_then(|p| p.unit_mut(id))
            .filter(|u| u.is_alive())
            .ok_or(GameError::EntityNotFound(id))
    }

    /// Contacts for every living entity, as the next frame will start with.
    #[must_use]
    pub fn snapshot(&self) -> ContactSheet {
        ContactSheet::capture(&self.players)
    }

    fn require_walkable(&self, position: Vec2Fixed) -> Result<()> {
        if self.map.is_walkable_at(position) {
            Ok(())
        } else {
            Err(unwalkable(position))
        }
    }

    /// Flyers ignore terrain but must stay on the map.
    fn require_reachable(&self, flying: bool, position: Vec2Fixed) -> Result<()> {
        if !flying {
            return self.require_walkable(position);
        }
        if self.map.contains(position) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                x: position.x.to_num(),
                y: position.y.to_num(),
            })
        }
    }

    fn require_placeable(&self, kind: BuildingKind, position: Vec2Fixed) -> Result<()> {
        if self.map.footprint_walkable(position, kind.stats().footprint) {
            Ok(())
        } else {
            Err(unwalkable(position))
        }
    }

    /// Order a unit to move. Ground units need a walkable destination,
    /// flyers one inside the map.
    pub fn issue_move(&mut self, unit: EntityId, goal: Vec2Fixed) -> Result<()> {
        let flying = self
            .unit(unit)
            .ok_or(GameError::EntityNotFound(unit))?
            .capabilities()
            .flying;
        self.require_reachable(flying, goal)?;
        self.unit_mut(unit)?.issue_move(goal);
        Ok(())
    }

    /// Order a unit to attack a living unit or structure other than itself.
    pub fn issue_attack(&mut self, unit: EntityId, target: EntityId) -> Result<()> {
        if self.unit(unit).is_none() {
            return Err(GameError::EntityNotFound(unit));
        }
        if unit == target {
            return Err(GameError::InvalidTarget {
                attacker: unit,
                target,
            });
        }
        if self.unit(target).is_none() && self.structure(target).is_none() {
            return Err(GameError::EntityNotFound(target));
        }
        self.unit_mut(unit)?.issue_attack(target);
        Ok(())
    }

    /// Clear a unit's order.
    pub fn stop(&mut self, unit: EntityId) -> Result<()> {
        self.unit_mut(unit)?.stop();
        Ok(())
    }

    /// Give a player income.
    pub fn add_resources(&mut self, player: PlayerId, minerals: u32, gas: u32) -> Result<()> {
        self.player_mut(player)?.add_resources(minerals, gas);
        Ok(())
    }

    /// Buy a unit for a player and place it.
    pub fn create_unit(&mut self, player: PlayerId, kind: UnitKind, position: Vec2Fixed) -> Result<EntityId> {
        self.player(player)?;
        self.require_reachable(kind.stats().ability.capabilities().flying, position)?;
        let id = self.player_mut(player)?.create_unit(kind, position)?;
        debug!(unit = %id, ?kind, "unit created");
        Ok(id)
    }

    /// Buy a building for a player. The footprint must be on open terrain.
    pub fn create_building(&mut self, player: PlayerId, kind: BuildingKind, position: Vec2Fixed) -> Result<EntityId> {
        self.player(player)?;
        self.require_placeable(kind, position)?;
        let id = self.player_mut(player)?.create_building(kind, position)?;
        debug!(structure = %id, ?kind, "construction started");
        Ok(id)
    }

    /// Buy a unit into a structure's production queue.
    pub fn queue_unit(&mut self, structure: EntityId, kind: UnitKind) -> Result<()> {
        let player = self
            .players
            .get_mut(structure.player.index())
            .ok_or(GameError::EntityNotFound(structure))?;
        player.queue_unit(structure, kind)
    }

    /// Place a unit for free, e.g. during scenario setup.
    pub fn spawn_unit(&mut self, player: PlayerId, kind: UnitKind, position: Vec2Fixed) -> Result<EntityId> {
        self.player(player)?;
        self.require_reachable(kind.stats().ability.capabilities().flying, position)?;
        Ok(self.player_mut(player)?.spawn_unit(kind, position))
    }

    /// Place a structure for free, e.g. during scenario setup.
    pub fn spawn_structure(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        position: Vec2Fixed,
        constructed: bool,
    ) -> Result<EntityId> {
        self.player(player)?;
        self.require_placeable(kind, position)?;
        Ok(self
            .player_mut(player)?
            .spawn_structure(kind, position, constructed))
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) -> TickEvents {
        let mut contacts = ContactSheet::capture(&self.players);
        let mut events = TickEvents {
            tick: self.tick + 1,
            ..TickEvents::default()
        };

        for index in 0..self.players.len() {
            let (before, rest) = self.players.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                break;
            };
            let mut field = Battlefield {
                current: current.id(),
                before,
                after,
                contacts: &mut contacts,
                map: &self.map,
                config: &self.config,
            };

            let report = current.tick(&mut field);
            events.hits.extend(report.hits);
            events.deaths.extend(report.removed);
            events.spawned.extend(report.spawned);
            events.constructed.extend(report.constructed);
        }

        for player in &mut self.players {
            events.deaths.extend(player.remove_dead());
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        debug!(tick = self.tick, hash = self.state_hash(), "tick complete");

        events
    }

    /// Hash of the full simulation state.
    ///
    /// Two worlds with the same hash are, for all practical purposes, in
    /// the same state. Used for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.players.len().hash(&mut hasher);

        for player in &self.players {
            player.id().hash(&mut hasher);
            player.race().hash(&mut hasher);
            player.resources().hash(&mut hasher);

            player.units().count().hash(&mut hasher);
            for unit in player.units() {
                unit.id().hash(&mut hasher);
                unit.kind().hash(&mut hasher);
                unit.position().x.to_bits().hash(&mut hasher);
                unit.position().y.to_bits().hash(&mut hasher);
                hash_pool(unit.health(), &mut hasher);
                unit.shield().map(|p| p.current().to_bits()).hash(&mut hasher);
                unit.energy().map(|p| p.current().to_bits()).hash(&mut hasher);
                unit.order().hash(&mut hasher);
                unit.attack_cooldown().hash(&mut hasher);
            }

            player.structures().count().hash(&mut hasher);
            for structure in player.structures() {
                structure.id().hash(&mut hasher);
                structure.kind().hash(&mut hasher);
                structure.position().x.to_bits().hash(&mut hasher);
                structure.position().y.to_bits().hash(&mut hasher);
                structure.construction_progress().hash(&mut hasher);
                hash_pool(structure.health(), &mut hasher);
                structure
                    .shield()
                    .map(|p| p.current().to_bits())
                    .hash(&mut hasher);
                for kind in structure.queue() {
                    kind.hash(&mut hasher);
                }
                structure.production_progress().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Check if a player has no living units or structures.
    ///
    /// Unknown players count as defeated.
    #[must_use]
    pub fn is_defeated(&self, player: PlayerId) -> bool {
        self.player(player).map_or(true, Player::is_defeated)
    }

    /// The last player standing, once every other player is defeated.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        if self.players.len() < 2 {
            return None;
        }
        let mut standing = self.players.iter().filter(|p| !p.is_defeated());
        match (standing.next(), standing.next()) {
            (Some(player), None) => Some(player.id()),
            _ => None,
        }
    }
}

fn hash_pool<H: Hasher>(pool: &Pool, hasher: &mut H) {
    pool.current().to_bits().hash(hasher);
    pool.max().to_bits().hash(hasher);
}

fn unwalkable(position: Vec2Fixed) -> GameError {
    GameError::Unwalkable {
        x: position.x.to_num(),
        y: position.y.to_num(),
    }
}

/// The world as seen from one player's tick.
struct Battlefield<'a> {
    current: PlayerId,
    before: &'a mut [Player],
    after: &'a mut [Player],
    contacts: &'a mut ContactSheet,
    map: &'a TileMap,
    config: &'a SimConfig,
}

impl Battlefield<'_> {
    fn other_player(&mut self, id: PlayerId) -> Option<&mut Player> {
        let index = id.index();
        let current = self.current.index();
        match index.cmp(&current) {
            Ordering::Less => self.before.get_mut(index),
            Ordering::Greater => self.after.get_mut(index - current - 1),
            Ordering::Equal => None,
        }
    }
}

impl WorldQuery for Battlefield<'_> {
    fn contact(&self, id: EntityId) -> Option<&Contact> {
        self.contacts.get(id)
    }

    fn contacts(&self) -> &[Contact] {
        self.contacts.as_slice()
    }

    fn is_walkable(&self, position: Vec2Fixed) -> bool {
        self.map.is_walkable_at(position)
    }

    fn is_on_map(&self, position: Vec2Fixed) -> bool {
        self.map.contains(position)
    }

    fn config(&self) -> &SimConfig {
        self.config
    }
}

impl Arena for Battlefield<'_> {
    fn record_position(&mut self, id: EntityId, position: Vec2Fixed) {
        self.contacts.move_to(id, position);
    }

    fn record_death(&mut self, id: EntityId) {
        self.contacts.mark_dead(id);
    }

    fn record_spawn(&mut self, contact: Contact) {
        self.contacts.insert(contact);
    }

    fn deliver(&mut self, hit: &Hit) -> Option<HitReport> {
        let report = self.other_player(hit.target.player)?.apply_hit(hit)?;
        if report.killed {
            self.contacts.mark_dead(hit.target);
        }
        Some(report)
    }
}
