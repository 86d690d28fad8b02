//! World and content fixtures for tests and benchmarks.

use foundry_core::prelude::*;

/// Extra content used by fixture worlds on top of the standard set.
pub const FIXTURE_CONTENT: &str = r#"(
    statuses: [
        (id: "sinking", duration: 30.0, kind: Modifiers(speed_multiplier: 0.5)),
    ],
    floors: [
        (
            id: "quicksand",
            is_liquid: true,
            speed_multiplier: 0.4,
            drag_multiplier: 1.5,
            drown_time: 40.0,
            status: Some("sinking"),
            liquid_color: (r: 0.8, g: 0.7, b: 0.4, a: 1.0),
        ),
    ],
)"#;

/// Standard content plus [`FIXTURE_CONTENT`].
///
/// # Panics
///
/// Panics if the fixture content stops parsing.
#[must_use]
pub fn content() -> ContentRegistry {
    let mut content = ContentRegistry::standard();
    content
        .merge_ron_str("fixtures", FIXTURE_CONTENT)
        .expect("fixture content parses");
    content
}

/// A 32x32 config with the given seed.
#[must_use]
pub fn config(seed: u64) -> SimConfig {
    SimConfig::default().with_seed(seed).with_size(32, 32)
}

/// An empty stone world.
///
/// # Panics
///
/// Panics if the fixture content is invalid.
#[must_use]
pub fn flat_world(seed: u64) -> Simulation {
    Simulation::new(config(seed), content()).expect("fixture world builds")
}

/// A world with a shallow band, a deep pool and a few moving units.
///
/// Contains two daggers wading toward the pool, a titan on tar and a flare
/// overhead, so every floor interaction runs each tick.
///
/// # Panics
///
/// Panics if the fixture content is invalid.
#[must_use]
pub fn water_world(seed: u64) -> Simulation {
    let mut sim = flat_world(seed);
    sim.paint_floor(&FloorId::from_static("shallow-water"), 0, 8, 31, 12)
        .expect("shallow-water registered");
    sim.paint_floor(&FloorId::from_static("deep-water"), 10, 13, 21, 24)
        .expect("deep-water registered");
    sim.paint_floor(&FloorId::from_static("tar"), 24, 0, 31, 6)
        .expect("tar registered");
    sim.grid_mut().set_wall(16, 4, true);

    let spawns = [
        ("dagger", Vec2::new(96.0, 40.0), Vec2::new(0.2, 1.0)),
        ("dagger", Vec2::new(140.0, 72.0), Vec2::new(-0.1, 0.8)),
        ("titan", Vec2::new(210.0, 20.0), Vec2::new(1.0, 0.5)),
        ("flare", Vec2::new(120.0, 120.0), Vec2::new(3.0, -2.0)),
    ];
    for (kind, position, impulse) in spawns {
        let id = sim
            .spawn_unit(&UnitTypeId::new(kind), Team::SHARDED, position)
            .expect("standard unit type");
        if let Some(unit) = sim.unit_mut(id) {
            unit.impulse(impulse);
        }
    }

    sim
}

/// A fuelled impact reactor at tile (12, 12) with the given warm-up,
/// surrounded by a ring of enemy daggers.
///
/// # Panics
///
/// Panics if the fixture content is invalid.
#[must_use]
pub fn reactor_world(seed: u64, warmup: f32) -> Simulation {
    let mut sim = flat_world(seed);
    let reactor = sim
        .place_generator(
            &GeneratorTypeId::from_static("impact-reactor"),
            Team::SHARDED,
            (12, 12),
        )
        .expect("reactor fits");
    sim.items_mut().add(reactor, BLAST_COMPOUND, 500);
    if let Some(generator) = sim.generator_mut(reactor) {
        generator.warmup = warmup;
    }

    let center = sim
        .generator(reactor)
        .map_or(Vec2::ZERO, GeneratorBlock::position);
    for i in 0..8u8 {
        let angle = f32::from(i) * std::f32::consts::FRAC_PI_4;
        let distance = 40.0 + 30.0 * f32::from(i);
        sim.spawn_unit(
            &UnitTypeId::from_static("dagger"),
            Team::CRUX,
            center + Vec2::from_angle(angle) * distance,
        )
        .expect("standard unit type");
    }

    tracing::debug!(reactor, warmup, "Built reactor fixture");
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_content_registers_quicksand() {
        let content = content();
        let floor = content.floor(&FloorId::from_static("quicksand")).unwrap();
        assert!(floor.is_liquid);
        assert_eq!(floor.status, Some(StatusId::from_static("sinking")));
    }

    #[test]
    fn test_water_world_populated() {
        let sim = water_world(1);
        assert_eq!(sim.units().count(), 4);
        assert!(sim.grid().floor(15, 15).is_liquid);
    }

    #[test]
    fn test_reactor_world() {
        let sim = reactor_world(1, 0.5);
        let reactor = sim.generators().next().unwrap();
        assert_eq!(reactor.warmup, 0.5);
        assert_eq!(sim.items().amount(reactor.id(), &BLAST_COMPOUND), 500);
        assert_eq!(sim.units().count(), 8);
    }
}
