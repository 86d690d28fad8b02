//! Replay checks for the simulation.
//!
//! A world built from the same seed and content must hash identically after
//! any number of ticks. Ordered entity maps, the seeded ChaCha stream and
//! the bounded effect queue are what make that hold; these helpers catch
//! regressions in any of them by running worlds side by side.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use foundry_core::simulation::Simulation;

/// Final hashes from a batch of identical runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// True when every hash matched.
    pub is_deterministic: bool,
    /// One final hash per run, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each run advanced.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|pair| pair[0] == pair[1]),
            hashes,
            ticks,
        }
    }

    /// Distinct hashes, sorted.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// # Panics
    ///
    /// Panics listing every run's hash when the runs disagreed.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "{} runs of {} ticks ended in {} different states: {:?}",
            self.hashes.len(),
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Build `runs` fresh states with `setup`, advance each `ticks` times with
/// `step`, and compare `hash` of the results.
///
/// Generic over the state so the harness itself can be tested on plain
/// values; [`verify_simulation_determinism`] is the usual entry point.
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
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();
    DeterminismResult::from_hashes(hashes, ticks)
}

/// Two runs of the same world agree after `num_ticks`.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Same as [`verify_determinism`] for simulations, but each run gets its own
/// scoped thread.
///
/// # Panics
///
/// Propagates a panic from any run.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let run = || {
        let mut sim = setup_fn();
        (0..num_ticks).for_each(|_| {
            sim.tick();
        });
        sim.state_hash()
    };
    let hashes = thread::scope(|scope| {
        let workers: Vec<_> = (0..num_sims).map(|_| scope.spawn(run)).collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("simulation worker panicked"))
            .collect()
    });
    DeterminismResult::from_hashes(hashes, num_ticks)
}

/// Step two copies of a world in lockstep and report the first tick whose
/// hashes differ. Tick 0 is the freshly built state.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let (mut left, mut right) = (setup_fn(), setup_fn());
    (0..=num_ticks).find(|&tick| {
        if tick > 0 {
            left.tick();
            right.tick();
        }
        left.state_hash() != right.state_hash()
    })
}

/// Snapshot a world after `warmup_ticks`, restore it, then run source and
/// copy for `num_ticks` more. Both must end in the same state.
///
/// The snapshot carries the RNG and the delayed-effect queue, so this also
/// covers an explosion that is still playing out when it is taken.
pub fn verify_serialization_determinism<F>(setup_fn: F, warmup_ticks: u64, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    (0..warmup_ticks).for_each(|_| {
        sim.tick();
    });

    let restored = sim
        .serialize()
        .and_then(|bytes| Simulation::deserialize(&bytes));
    let Ok(mut restored) = restored else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        sim.tick();
        restored.tick();
    }
    sim.state_hash() == restored.state_hash()
}

/// Hash any value with the std hasher.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use foundry_core::data::ContentRegistry;
    use foundry_core::math::Vec2;
    use foundry_core::terrain::Floor;
    use proptest::prelude::*;

    /// A velocity or impulse with components in `-range..range`.
    pub fn arb_velocity(range: f32) -> impl Strategy<Value = Vec2> {
        (-range..range, -range..range).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// A per-tick time step, from a fraction of a frame to a slow frame.
    pub fn arb_delta() -> impl Strategy<Value = f32> {
        0.05f32..3.0
    }

    /// Warm-up or other unit-interval value.
    pub fn arb_unit_interval() -> impl Strategy<Value = f32> {
        0.0f32..=1.0
    }

    /// One of the built-in floors, drawn from the standard content set.
    pub fn arb_standard_floor() -> impl Strategy<Value = Floor> {
        let floors: Vec<Floor> = ContentRegistry::standard().floors().cloned().collect();
        proptest::sample::select(floors)
    }

    /// An arbitrary floor definition without a contact status.
    pub fn arb_floor() -> impl Strategy<Value = Floor> {
        (
            any::<bool>(),
            0.1f32..2.0,
            0.0f32..2.0,
            0.0f32..2.0,
            prop_oneof![Just(0.0f32), 1.0f32..300.0],
        )
            .prop_map(|(is_liquid, speed, drag, damage, drown_time)| Floor {
                is_liquid,
                speed_multiplier: speed,
                drag_multiplier: drag,
                damage_per_tick: damage,
                drown_time,
                ..Floor::plain("arbitrary")
            })
    }
}
