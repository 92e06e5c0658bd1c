//! World query capability handed to entities during a tick.
//!
//! Units never hold a reference back to the world. Instead each tick
//! receives a [`WorldQuery`]: a read-only list of contacts (every live
//! entity's id, position and body), the terrain and the config.
//!
//! A player's tick runs against an [`Arena`], which extends the query with
//! the few writes the tick needs: moving its own contacts, and delivering
//! hits to entities owned by other players.

use std::collections::HashMap;

use crate::combat::{Hit, HitReport};
use crate::components::EntityId;
use crate::config::SimConfig;
use crate::map::TileMap;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::Player;
use crate::stats::Footprint;
use crate::structure::Structure;
use crate::unit::Unit;

/// Collision layer of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    /// Walking unit.
    Ground,
    /// Flying unit.
    Air,
    /// Building. Never an obstacle for units.
    Structure,
}

/// What other entities can see of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Entity id.
    pub id: EntityId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Collision layer.
    pub body: Body,
    /// Cleared the moment the entity's health reaches zero.
    pub alive: bool,
    /// Tiles covered from `position`, for structures.
    pub footprint: Option<Footprint>,
}

impl Contact {
    /// Contact for a unit.
    #[must_use]
    pub fn of_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            position: unit.position(),
            body: unit.body(),
            alive: unit.is_alive(),
            footprint: None,
        }
    }

    /// Contact for a structure.
    #[must_use]
    pub fn of_structure(structure: &Structure) -> Self {
        Self {
            id: structure.id(),
            position: structure.position(),
            body: Body::Structure,
            alive: structure.is_alive(),
            footprint: Some(structure.stats().footprint),
        }
    }

    /// Closest point of this entity to `from`.
    ///
    /// Units are points. Structures cover their footprint, so the point is
    /// `from` clamped into the footprint rectangle.
    #[must_use]
    pub fn nearest_point(&self, from: Vec2Fixed, tile_size: u32) -> Vec2Fixed {
        let Some(footprint) = self.footprint else {
            return self.position;
        };
        let tile = Fixed::from_num(tile_size);
        let far = self.position
            + Vec2Fixed::new(
                tile * Fixed::from_num(footprint.width),
                tile * Fixed::from_num(footprint.height),
            );
        Vec2Fixed::new(
            from.x.clamp(self.position.x, far.x),
            from.y.clamp(self.position.y, far.y),
        )
    }
}

/// Id-indexed list of contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactSheet {
    contacts: Vec<Contact>,
    index: HashMap<EntityId, usize>,
}

impl ContactSheet {
    /// Create an empty sheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every live entity of every player, in player then id order.
    #[must_use]
    pub fn capture(players: &[Player]) -> Self {
        let mut sheet = Self::new();
        for player in players {
            for unit in player.units().filter(|u| u.is_alive()) {
                sheet.insert(Contact::of_unit(unit));
            }
            for structure in player.structures().filter(|s| s.is_alive()) {
                sheet.insert(Contact::of_structure(structure));
            }
        }
        sheet
    }

    /// Add a contact, replacing any previous contact with the same id.
    pub fn insert(&mut self, contact: Contact) {
        if let Some(&i) = self.index.get(&contact.id) {
            self.contacts[i] = contact;
        } else {
            self.index.insert(contact.id, self.contacts.len());
            self.contacts.push(contact);
        }
    }

    /// Look up a contact.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Contact> {
        self.index.get(&id).map(|&i| &self.contacts[i])
    }

    /// All contacts, including dead ones.
    #[must_use]
    pub fn as_slice(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Check if the sheet is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Update a contact's position.
    pub fn move_to(&mut self, id: EntityId, position: Vec2Fixed) {
        if let Some(&i) = self.index.get(&id) {
            self.contacts[i].position = position;
        }
    }

    /// Flag a contact as dead.
    pub fn mark_dead(&mut self, id: EntityId) {
        if let Some(&i) = self.index.get(&id) {
            self.contacts[i].alive = false;
        }
    }
}

/// Read-only view of the world used by entity ticks.
pub trait WorldQuery {
    /// Look up any entity by id.
    fn contact(&self, id: EntityId) -> Option<&Contact>;

    /// Every known entity. Dead entities may still be listed with
    /// `alive == false`.
    fn contacts(&self) -> &[Contact];

    /// Check terrain at a world position.
    fn is_walkable(&self, position: Vec2Fixed) -> bool;

    /// Check if a world position is inside the map, whatever the terrain.
    fn is_on_map(&self, position: Vec2Fixed) -> bool;

    /// Simulation constants.
    fn config(&self) -> &SimConfig;
}

/// Mutable side of the world as seen from one player's tick.
pub trait Arena: WorldQuery {
    /// A unit committed a move.
    fn record_position(&mut self, id: EntityId, position: Vec2Fixed);

    /// An entity's health reached zero.
    fn record_death(&mut self, id: EntityId);

    /// A new entity entered the world.
    fn record_spawn(&mut self, contact: Contact);

    /// Apply a hit to an entity owned by another player.
    ///
    /// Returns `None` if the target does not exist or is already dead.
    fn deliver(&mut self, hit: &Hit) -> Option<HitReport>;
}

/// A [`WorldQuery`] over borrowed parts, for reads outside a tick.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    contacts: &'a ContactSheet,
    map: &'a TileMap,
    config: &'a SimConfig,
}

impl<'a> SnapshotView<'a> {
    /// Assemble a view.
    #[must_use]
    pub const fn new(contacts: &'a ContactSheet, map: &'a TileMap, config: &'a SimConfig) -> Self {
        Self {
            contacts,
            map,
            config,
        }
    }
}

impl WorldQuery for SnapshotView<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;

    fn contact(serial: u32, x: i32) -> Contact {
        Contact {
            id: EntityId::new(PlayerId(0), serial),
            position: Vec2Fixed::from_ints(x, 0),
            body: Body::Ground,
            alive: true,
            footprint: None,
        }
    }

    #[test]
    fn test_sheet_insert_and_update() {
        let mut sheet = ContactSheet::new();
        sheet.insert(contact(0, 10));
        sheet.insert(contact(1, 20));
        assert_eq!(sheet.len(), 2);

        let id = EntityId::new(PlayerId(0), 1);
        sheet.move_to(id, Vec2Fixed::from_ints(25, 5));
        assert_eq!(sheet.get(id).map(|c| c.position), Some(Vec2Fixed::from_ints(25, 5)));

        sheet.mark_dead(id);
        assert_eq!(sheet.get(id).map(|c| c.alive), Some(false));

        sheet.insert(contact(1, 30));
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.get(id).map(|c| c.alive), Some(true));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut sheet = ContactSheet::new();
        let ghost = EntityId::new(PlayerId(3), 9);
        sheet.move_to(ghost, Vec2Fixed::ZERO);
        sheet.mark_dead(ghost);
        assert!(sheet.get(ghost).is_none());
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_snapshot_view() {
        let mut sheet = ContactSheet::new();
        sheet.insert(contact(0, 10));
        let map = TileMap::open(2, 2, 32);
        let config = SimConfig::default();
        let view = SnapshotView::new(&sheet, &map, &config);

        assert_eq!(view.contacts().len(), 1);
        assert!(view.is_walkable(Vec2Fixed::from_ints(40, 40)));
        assert!(!view.is_walkable(Vec2Fixed::from_ints(64, 0)));
        assert!(view.is_on_map(Vec2Fixed::from_ints(63, 63)));
        assert!(!view.is_on_map(Vec2Fixed::from_ints(-1, 0)));
        assert_eq!(view.config().tile_size, 32);
    }

    #[test]
    fn test_nearest_point_covers_footprint() {
        let barracks = Contact {
            body: Body::Structure,
            footprint: Some(Footprint {
                width: 3,
                height: 2,
            }),
            ..contact(0, 64)
        };

        // footprint spans (64, 0) to (160, 64)
        let left = Vec2Fixed::from_ints(0, 30);
        assert_eq!(barracks.nearest_point(left, 32), Vec2Fixed::from_ints(64, 30));
        let below_right = Vec2Fixed::from_ints(300, 200);
        assert_eq!(
            barracks.nearest_point(below_right, 32),
            Vec2Fixed::from_ints(160, 64)
        );
        let inside = Vec2Fixed::from_ints(100, 10);
        assert_eq!(barracks.nearest_point(inside, 32), inside);

        let marine = contact(1, 64);
        assert_eq!(marine.nearest_point(below_right, 32), marine.position);
    }
}
