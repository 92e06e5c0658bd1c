//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the simulation guards against:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entities live in id-ordered maps and are always visited in that order.
//!
//! - **System randomness**: Terrain scatter uses a seeded generator, and
//!   nothing else in the core is random.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// [`verify_determinism`] specialised to [`World`].
///
/// # Example
///
/// ```
/// use skirmish_test_utils::determinism::verify_world_determinism;
/// use skirmish_test_utils::fixtures::skirmish_world;
///
/// verify_world_determinism(3, 120, skirmish_world).assert_deterministic();
/// ```
pub fn verify_world_determinism<F>(runs: usize, ticks: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> World,
{
    verify_determinism(
        runs,
        ticks,
        setup,
        |world| {
            world.tick();
        },
        World::state_hash,
    )
}

/// Run N worlds on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under different thread
/// scheduling or memory layout.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_worlds<F>(setup: F, count: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> World + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..count)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup();
                    for _ in 0..ticks {
                        world.tick();
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(tick)` for the first tick
/// after which their hashes differ (0 for differing initial states).
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut a = setup();
    let mut b = setup();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        a.tick();
        b.tick();

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::math::{Fixed, Vec2Fixed};
    use skirmish_core::stats::UnitKind;

    /// Generate a whole-unit coordinate in `0..max`.
    pub fn arb_coordinate(max: i32) -> impl Strategy<Value = Fixed> {
        (0..max).prop_map(Fixed::from_num)
    }

    /// Generate a position inside a 1280 x 960 world.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(1280), arb_coordinate(960)).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate any unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        proptest::sample::select(UnitKind::ALL.to_vec())
    }

    /// Generate damage values (0-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        0u32..100u32
    }

    /// Generate a sequence of damage values.
    pub fn arb_damage_sequence(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(arb_damage(), 0..max_len)
    }

    /// Generate an army: unit kinds with positions.
    pub fn arb_army(max_units: usize) -> impl Strategy<Value = Vec<(UnitKind, Vec2Fixed)>> {
        proptest::collection::vec((arb_unit_kind(), arb_position()), 1..max_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{open_world, pos, skirmish_world};
    use proptest::prelude::*;
    use skirmish_core::stats::{Race, UnitKind};

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_divergence() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let counter = AtomicU64::new(0);
        let result = verify_determinism(
            2,
            1,
            || counter.fetch_add(1, Ordering::SeqCst),
            |_| {},
            |n| *n,
        );

        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_empty_world_determinism() {
        verify_world_determinism(2, 50, || open_world(10, 10)).assert_deterministic();
    }

    #[test]
    fn test_skirmish_determinism() {
        verify_world_determinism(3, 300, skirmish_world).assert_deterministic();
        assert_eq!(find_first_divergence(skirmish_world, 300), None);
    }

    #[test]
    fn test_parallel_worlds_match() {
        run_parallel_worlds(skirmish_world, 4, 200).assert_deterministic();
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_random_armies_are_deterministic(
            army in strategies::arb_army(12),
            goal in strategies::arb_position(),
        ) {
            let setup = || {
                let mut world = open_world(40, 30);
                let player = world.add_player(Race::Protoss).unwrap();
                for (kind, position) in &army {
                    let id = world.spawn_unit(player, *kind, *position).unwrap();
                    world.issue_move(id, goal).unwrap();
                }
                world.spawn_unit(player, UnitKind::Zealot, pos(10, 10)).unwrap();
                world
            };

            prop_assert_eq!(find_first_divergence(setup, 60), None);
        }
    }
}
