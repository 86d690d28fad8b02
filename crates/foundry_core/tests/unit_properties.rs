//! Property tests for unit integration against arbitrary floors and inputs.

use foundry_core::effects::EffectLog;
use foundry_core::entity::Team;
use foundry_core::ids::StatusId;
use foundry_core::math::Vec2;
use foundry_core::status::{StatusController, StatusEffectDef, StatusKind, StatusRegistry};
use foundry_core::terrain::{Floor, NoCollision, TerrainQuery};
use foundry_core::timer::Timers;
use foundry_core::unit::{Unit, UnitContext, UnitType};
use foundry_core::data::ContentRegistry;
use foundry_test_utils::determinism::strategies::{
    arb_delta, arb_floor, arb_standard_floor, arb_velocity,
};
use proptest::prelude::*;

struct Flat(Floor);

impl TerrainQuery for Flat {
    fn floor_at(&self, _position: Vec2) -> &Floor {
        &self.0
    }
}

struct Harness {
    terrain: Flat,
    statuses: StatusRegistry,
    timers: Timers,
    effects: EffectLog,
}

impl Harness {
    fn new(floor: Floor) -> Self {
        Self {
            terrain: Flat(floor),
            statuses: StatusRegistry::new(),
            timers: Timers::new(),
            effects: EffectLog::new(),
        }
    }

    fn with_standard_statuses(floor: Floor) -> Self {
        Self {
            statuses: ContentRegistry::standard().statuses().clone(),
            ..Self::new(floor)
        }
    }

    fn step(&mut self, unit: &mut Unit, delta: f32) {
        let mut ctx = UnitContext {
            delta,
            terrain: &self.terrain,
            collider: &NoCollision,
            statuses: &self.statuses,
            timers: &mut self.timers,
            effects: &mut self.effects,
        };
        unit.update(&mut ctx);
    }
}

fn any_delta() -> impl Strategy<Value = f32> {
    prop_oneof![Just(0.0f32), arb_delta()]
}

proptest! {
    #[test]
    fn prop_drown_progress_stays_in_unit_interval(
        floor in arb_floor(),
        velocity in arb_velocity(10.0),
        deltas in prop::collection::vec(any_delta(), 1..80),
    ) {
        let mut harness = Harness::new(floor);
        let mut unit = Unit::new(1, UnitType::ground("dagger"), Team::SHARDED, Vec2::ZERO);
        unit.body.max_health = 1e9;
        unit.body.health = 1e9;
        unit.velocity = velocity;

        for delta in deltas {
            harness.step(&mut unit, delta);
            prop_assert!((0.0..=1.0).contains(&unit.drown_time));
        }
    }

    #[test]
    fn prop_dry_standard_floors_only_drain_drown_progress(
        floor in arb_standard_floor(),
        velocity in arb_velocity(3.0),
        ticks in 1usize..120,
    ) {
        let drowns = floor.drown_time > 0.0;
        let mut harness = Harness::with_standard_statuses(floor);
        let mut unit = Unit::new(1, UnitType::ground("dagger"), Team::SHARDED, Vec2::ZERO);
        unit.body.max_health = 1e9;
        unit.body.health = 1e9;
        unit.drown_time = 0.5;
        unit.velocity = velocity;

        let mut last = unit.drown_time;
        for _ in 0..ticks {
            harness.step(&mut unit, 1.0);
            prop_assert!((0.0..=1.0).contains(&unit.drown_time));
            if !drowns {
                prop_assert!(unit.drown_time <= last);
            }
            last = unit.drown_time;
        }
    }

    #[test]
    fn prop_flying_units_ignore_terrain(
        floor in arb_floor(),
        velocity in arb_velocity(4.0),
        delta in arb_delta(),
        ticks in 1usize..60,
    ) {
        let mut harness = Harness::new(floor);
        let mut unit = Unit::new(1, UnitType::air("flare"), Team::SHARDED, Vec2::ZERO);
        unit.velocity = velocity;
        let health = unit.body.health;

        for _ in 0..ticks {
            harness.step(&mut unit, delta);
        }

        prop_assert_eq!(unit.drown_time, 0.0);
        prop_assert_eq!(unit.body.health, health);
        prop_assert!(harness.effects.is_empty());
        prop_assert!(unit.status.is_empty());
    }

    #[test]
    fn prop_velocity_never_exceeds_cap(
        velocity in arb_velocity(50.0),
        cap in 0.1f32..8.0,
        delta in arb_delta(),
    ) {
        let mut harness = Harness::new(Floor::plain("stone"));
        let kind = UnitType { max_velocity: cap, ..UnitType::ground("dagger") };
        let mut unit = Unit::new(1, kind, Team::SHARDED, Vec2::ZERO);
        unit.velocity = velocity;

        harness.step(&mut unit, delta);
        prop_assert!(unit.velocity.length() <= cap * (1.0 + 1e-5));
    }

    #[test]
    fn prop_repeated_contact_is_idempotent(
        repeats in 1usize..20,
        intensity in 0.1f32..3.0,
    ) {
        let registry: StatusRegistry = [StatusEffectDef {
            id: StatusId::from_static("wet"),
            duration: 90.0,
            kind: StatusKind::Modifiers { speed_multiplier: 0.9 },
        }]
        .into_iter()
        .collect();
        let wet = StatusId::from_static("wet");

        let mut controller = StatusController::new();
        for _ in 0..repeats {
            controller.apply_from_contact(&registry, Some(&wet), intensity);
        }
        prop_assert_eq!(controller.len(), 1);
        prop_assert_eq!(controller.remaining(&wet), Some(90.0));
    }
}

#[test]
fn drowning_unit_with_low_health_dies_on_the_filling_tick() {
    let floor = Floor {
        is_liquid: true,
        drown_time: 8.0,
        ..Floor::plain("deep-water")
    };
    let mut harness = Harness::new(floor);
    let mut unit = Unit::new(1, UnitType::ground("dagger"), Team::SHARDED, Vec2::ZERO);
    unit.body.health = 10.0;
    unit.drown_time = 0.875;

    harness.step(&mut unit, 1.0);

    assert!(unit.is_dead());
    assert!(unit.body.health <= 0.0);
    assert_eq!(unit.hit_time, 0.0);
    assert_eq!(unit.drown_time, 0.0);
}
