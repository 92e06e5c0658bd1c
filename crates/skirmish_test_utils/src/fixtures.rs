//! Test fixtures and helpers.
//!
//! Pre-built worlds and entity lineups for consistent testing.

use fixed::types::I32F32;
use skirmish_core::components::{EntityId, PlayerId};
use skirmish_core::config::SimConfig;
use skirmish_core::map::TileMap;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::stats::{BuildingKind, Race, UnitKind};
use skirmish_core::world::World;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a position from whole world units.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// An empty world on an open map of `width` x `height` tiles.
#[must_use]
pub fn open_world(width: u32, height: u32) -> World {
    World::new(TileMap::open(width, height, 32), SimConfig::default())
}

/// Spawn `count` units in a row, `spacing` apart along x.
///
/// # Panics
///
/// Panics if a unit cannot be placed.
pub fn line_up(
    world: &mut World,
    player: PlayerId,
    kind: UnitKind,
    start: Vec2Fixed,
    count: u32,
    spacing: i32,
) -> Vec<EntityId> {
    (0..count)
        .map(|i| {
            let offset = fixed(spacing) * I32F32::from_num(i);
            world
                .spawn_unit(player, kind, Vec2Fixed::new(start.x + offset, start.y))
                .expect("fixture unit placement")
        })
        .collect()
}

/// Two players facing each other with mixed armies and production.
///
/// Terran fields marines, a firebat and a medic next to a built
/// barracks with a marine queued. Zerg fields zerglings and a hydralisk
/// next to a built hatchery with a zergling queued. Every fighting unit
/// is ordered onto the first enemy of the opposing line.
///
/// # Panics
///
/// Panics if the fixture cannot be built.
#[must_use]
pub fn skirmish_world() -> World {
    let mut world = open_world(40, 30);
    let terran = world.add_player(Race::Terran).expect("terran");
    let zerg = world.add_player(Race::Zerg).expect("zerg");
    world.add_resources(terran, 500, 100).expect("income");
    world.add_resources(zerg, 500, 100).expect("income");

    let marines = line_up(&mut world, terran, UnitKind::Marine, pos(200, 400), 4, 40);
    let firebat = line_up(&mut world, terran, UnitKind::Firebat, pos(240, 460), 1, 40);
    let medic = line_up(&mut world, terran, UnitKind::Medic, pos(200, 340), 1, 40);
    let zerglings = line_up(&mut world, zerg, UnitKind::Zergling, pos(800, 400), 6, 40);
    let hydras = line_up(&mut world, zerg, UnitKind::Hydralisk, pos(840, 460), 1, 40);

    let barracks = world
        .spawn_structure(terran, BuildingKind::Barracks, pos(64, 64), true)
        .expect("barracks");
    world.queue_unit(barracks, UnitKind::Marine).expect("queue");
    let hatchery = world
        .spawn_structure(zerg, BuildingKind::Hatchery, pos(1024, 64), true)
        .expect("hatchery");
    world.queue_unit(hatchery, UnitKind::Zergling).expect("queue");

    for unit in marines.iter().chain(&firebat) {
        world.issue_attack(*unit, zerglings[0]).expect("attack");
    }
    for unit in zerglings.iter().chain(&hydras) {
        world.issue_attack(*unit, marines[0]).expect("attack");
    }
    world.issue_attack(medic[0], marines[0]).expect("heal");

    world
}
