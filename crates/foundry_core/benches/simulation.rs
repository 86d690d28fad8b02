//! Simulation benchmarks for foundry_core.
//!
//! Run with: `cargo bench -p foundry_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use foundry_core::prelude::*;
use foundry_test_utils::fixtures;

fn crowded_water_world() -> Simulation {
    let mut sim = fixtures::water_world(42);
    for i in 0..200u16 {
        let x = f32::from(i % 20) * 12.0 + 8.0;
        let y = f32::from(i / 20) * 12.0 + 60.0;
        if let Ok(id) = sim.spawn_unit(&UnitTypeId::from_static("dagger"), Team::CRUX, Vec2::new(x, y)) {
            if let Some(unit) = sim.unit_mut(id) {
                unit.impulse(Vec2::new(0.5, 0.7));
            }
        }
    }
    sim
}

/// Runs simulation benchmarks for the foundry_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_200_units_on_water", |b| {
        b.iter_batched(
            crowded_water_world,
            |mut sim| {
                for _ in 0..10 {
                    black_box(sim.tick());
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("reactor_explosion", |b| {
        b.iter_batched(
            || fixtures::reactor_world(7, 1.0),
            |mut sim| {
                let id = sim.generators().next().map(GeneratorBlock::id);
                if let Some(id) = id {
                    black_box(sim.destroy_structure(id).ok());
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash", |b| {
        let sim = crowded_water_world();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
