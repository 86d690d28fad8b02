//! Mobile unit simulation.
//!
//! [`Unit::update_velocity_status`] is the per-tick integration step:
//! velocity clamping, status effects, floor interaction (splashes, contact
//! statuses, floor damage, drowning), movement and drag. Unit variants differ
//! only through [`UnitCapabilities`]; nothing here inspects a concrete type.

use serde::{Deserialize, Serialize};

use crate::effects::{EffectRequest, EffectSink};
use crate::entity::{Body, Team};
use crate::ids::{EntityId, UnitTypeId};
use crate::math::{clamp01, lerp_delta, Vec2};
use crate::status::{StatusController, StatusRegistry, StatusTarget};
use crate::terrain::{Collider, TerrainQuery};
use crate::timer::{TimerKey, Timers};

/// Ticks a hit flash lasts after damage.
pub const HIT_DURATION: f32 = 9.0;

/// Minimum speed before wading produces splashes.
const SPLASH_MIN_SPEED: f32 = 0.4;
/// Base interval of the splash timer, shortened by speed.
const SPLASH_BASE_INTERVAL: f32 = 14.0;
const DROWN_EFFECT_INTERVAL: f32 = 15.0;
const DAMAGE_EFFECT_INTERVAL: f32 = 20.0;
/// Per-tick fraction of drown progress lost when not submerged.
const DROWN_RECOVERY: f32 = 0.03;
const MIN_MASS: f32 = 0.001;

/// Physical capabilities of a unit variant.
pub trait UnitCapabilities {
    /// Mass. Velocity is divided by it before being applied.
    fn mass(&self) -> f32;
    /// Flying units ignore floors entirely.
    fn is_flying(&self) -> bool;
    /// Hitbox edge length in world units.
    fn size(&self) -> f32;
}

/// Data definition of a unit variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    /// Unique id.
    pub id: UnitTypeId,
    /// Mass.
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Whether the unit flies.
    #[serde(default)]
    pub flying: bool,
    /// Hitbox size in world units.
    #[serde(default = "default_size")]
    pub size: f32,
    /// Velocity drag coefficient per tick.
    #[serde(default = "default_drag")]
    pub drag: f32,
    /// Velocity magnitude cap.
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f32,
    /// Maximum health.
    #[serde(default = "default_health")]
    pub health: f32,
}

fn default_mass() -> f32 {
    1.0
}
fn default_size() -> f32 {
    8.0
}
fn default_drag() -> f32 {
    0.1
}
fn default_max_velocity() -> f32 {
    5.0
}
fn default_health() -> f32 {
    100.0
}

impl UnitType {
    /// A grounded unit type with default stats.
    #[must_use]
    pub fn ground(id: impl Into<String>) -> Self {
        Self {
            id: UnitTypeId::new(id),
            mass: default_mass(),
            flying: false,
            size: default_size(),
            drag: default_drag(),
            max_velocity: default_max_velocity(),
            health: default_health(),
        }
    }

    /// A flying unit type with default stats.
    #[must_use]
    pub fn air(id: impl Into<String>) -> Self {
        Self {
            flying: true,
            ..Self::ground(id)
        }
    }
}

impl UnitCapabilities for UnitType {
    fn mass(&self) -> f32 {
        self.mass.max(MIN_MASS)
    }

    fn is_flying(&self) -> bool {
        self.flying
    }

    fn size(&self) -> f32 {
        self.size
    }
}

/// World access for one unit update.
pub struct UnitContext<'a> {
    /// Tick delta (1.0 = one 60 Hz frame).
    pub delta: f32,
    /// Floor lookup.
    pub terrain: &'a dyn TerrainQuery,
    /// Grounded movement resolution.
    pub collider: &'a dyn Collider,
    /// Status effect definitions.
    pub statuses: &'a StatusRegistry,
    /// Per-actor timers.
    pub timers: &'a mut Timers,
    /// Effect requests.
    pub effects: &'a mut dyn EffectSink,
}

/// A mobile actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Shared entity state.
    pub body: Body,
    /// Variant definition.
    pub kind: UnitType,
    /// Velocity in world units per tick, before mass scaling.
    pub velocity: Vec2,
    /// Remaining hit flash time. Visual only.
    pub hit_time: f32,
    /// Drown progress in `[0, 1]`. Reaching 1 kills the unit.
    pub drown_time: f32,
    /// Active status effects.
    pub status: StatusController,
}

impl Unit {
    /// Create a unit at full health, at rest.
    #[must_use]
    pub fn new(id: EntityId, kind: UnitType, team: Team, position: Vec2) -> Self {
        Self {
            body: Body::new(id, team, position, kind.health),
            kind,
            velocity: Vec2::ZERO,
            hit_time: 0.0,
            drown_time: 0.0,
            status: StatusController::new(),
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.body.id
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Whether the unit has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.body.is_dead()
    }

    /// Full tick: hit flash countdown, then integration with the variant's own
    /// drag and velocity cap.
    pub fn update(&mut self, ctx: &mut UnitContext<'_>) {
        self.hit_time = (self.hit_time - ctx.delta).max(0.0);
        let (drag, max_velocity) = (self.kind.drag, self.kind.max_velocity);
        self.update_velocity_status(ctx, drag, max_velocity);
    }

    /// Integrate one tick of velocity, status and floor interaction.
    pub fn update_velocity_status(
        &mut self,
        ctx: &mut UnitContext<'_>,
        drag: f32,
        max_velocity: f32,
    ) {
        if self.body.is_dead() {
            return;
        }

        let id = self.body.id;
        let delta = ctx.delta;
        let terrain = ctx.terrain;
        let floor = terrain.floor_at(self.body.position);

        self.velocity = self.velocity.clamp_length_max(max_velocity.max(0.0));

        let status = self.status.update(
            ctx.statuses,
            &mut StatusTarget {
                body: &mut self.body,
                velocity: &mut self.velocity,
            },
            delta,
        );
        if status.killed {
            self.on_death();
            return;
        }

        let mass = self.kind.mass();

        if self.kind.is_flying() {
            self.body.position += self.velocity / mass;
            self.velocity *= clamp01(1.0 - drag * delta);
            return;
        }

        let speed = self.velocity.length();
        if floor.is_liquid
            && speed > SPLASH_MIN_SPEED
            && ctx.timers.get(
                id,
                TimerKey::FloorEffect,
                SPLASH_BASE_INTERVAL - speed * floor.speed_multiplier * 2.0,
                delta,
            )
        {
            ctx.effects.effect(EffectRequest::tinted(
                floor.walk_effect.clone(),
                floor.liquid_color,
                self.body.position,
            ));
        }

        self.status
            .apply_from_contact(ctx.statuses, floor.status.as_ref(), floor.status_intensity);

        if floor.damage_per_tick > 0.0 && self.damage_periodic(ctx, floor.damage_per_tick) {
            return;
        }

        if floor.drown_time > 0.0 {
            self.drown_time += delta / floor.drown_time;
            if ctx
                .timers
                .get(id, TimerKey::DrownEffect, DROWN_EFFECT_INTERVAL, delta)
            {
                ctx.effects.effect(EffectRequest::tinted(
                    floor.drown_effect.clone(),
                    floor.liquid_color,
                    self.body.position,
                ));
            }
        } else {
            self.drown_time = lerp_delta(self.drown_time, 0.0, DROWN_RECOVERY, delta);
        }

        self.drown_time = clamp01(self.drown_time);

        if self.drown_time >= 1.0 {
            let lethal = self.body.health + 1.0;
            if self.damage_with_effect(lethal, false) {
                tracing::debug!(unit = id, "Unit drowned");
                return;
            }
        }

        let step = self.velocity / mass
            * floor.speed_multiplier
            * self.status.modifiers().speed_multiplier;
        self.body.position = ctx
            .collider
            .resolve_move(self.body.position, step, self.kind.size());

        self.velocity *= clamp01(1.0 - drag * floor.drag_multiplier * delta);
    }

    /// Take damage with a hit flash. Returns `true` if this killed the unit.
    pub fn damage(&mut self, amount: f32) -> bool {
        self.damage_with_effect(amount, true)
    }

    /// Take damage, optionally without the hit flash.
    /// Returns `true` if this killed the unit.
    pub fn damage_with_effect(&mut self, amount: f32, with_effect: bool) -> bool {
        if with_effect {
            self.hit_time = HIT_DURATION;
        }
        let killed = self.body.damage(amount);
        if killed {
            self.on_death();
        }
        killed
    }

    /// Take `amount` per tick scaled by the tick delta. The hit flash is
    /// rate limited by the unit's damage-effect timer.
    pub fn damage_periodic(&mut self, ctx: &mut UnitContext<'_>, amount: f32) -> bool {
        let flash = ctx.timers.get(
            self.body.id,
            TimerKey::DamageEffect,
            DAMAGE_EFFECT_INTERVAL,
            ctx.delta,
        );
        self.damage_with_effect(amount * ctx.delta, flash)
    }

    /// Death hook: nothing timed survives the unit.
    pub fn on_death(&mut self) {
        self.drown_time = 0.0;
        self.status.clear();
    }

    /// Push the unit. Heavier units accelerate less.
    pub fn impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse / self.kind.mass();
    }

    /// Move instantly, ignoring collision.
    pub fn teleport(&mut self, position: Vec2) {
        self.body.position = position;
    }

    /// Whether a projectile of `team` can hit this unit.
    #[must_use]
    pub const fn collides_with(&self, team: Team) -> bool {
        self.body.team.is_enemy_of(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{fx, Color, EffectLog};
    use crate::ids::{FloorId, StatusId};
    use crate::status::{StatusEffectDef, StatusKind};
    use crate::terrain::{Floor, NoCollision};

    struct Flat(Floor);

    impl TerrainQuery for Flat {
        fn floor_at(&self, _position: Vec2) -> &Floor {
            &self.0
        }
    }

    fn deep_water() -> Floor {
        Floor {
            id: FloorId::from_static("deep-water"),
            is_liquid: true,
            speed_multiplier: 0.2,
            drag_multiplier: 1.0,
            drown_time: 8.0,
            status: Some(StatusId::from_static("wet")),
            status_intensity: 1.0,
            walk_effect: fx::RIPPLE,
            drown_effect: fx::BUBBLE,
            liquid_color: Color::from_hex("4d5ec9").unwrap_or_default(),
            ..Floor::plain("deep-water")
        }
    }

    fn statuses() -> StatusRegistry {
        [
            StatusEffectDef {
                id: StatusId::from_static("wet"),
                duration: 90.0,
                kind: StatusKind::Modifiers {
                    speed_multiplier: 0.9,
                },
            },
            StatusEffectDef {
                id: StatusId::from_static("melting"),
                duration: 60.0,
                kind: StatusKind::Damage { per_tick: 50.0 },
            },
        ]
        .into_iter()
        .collect()
    }

    struct World {
        terrain: Flat,
        statuses: StatusRegistry,
        timers: Timers,
        effects: EffectLog,
    }

    impl World {
        fn new(floor: Floor) -> Self {
            Self {
                terrain: Flat(floor),
                statuses: statuses(),
                timers: Timers::new(),
                effects: EffectLog::new(),
            }
        }

        fn step(&mut self, unit: &mut Unit, delta: f32, drag: f32, max_velocity: f32) {
            let mut ctx = UnitContext {
                delta,
                terrain: &self.terrain,
                collider: &NoCollision,
                statuses: &self.statuses,
                timers: &mut self.timers,
                effects: &mut self.effects,
            };
            unit.update_velocity_status(&mut ctx, drag, max_velocity);
        }
    }

    fn ground_unit() -> Unit {
        Unit::new(1, UnitType::ground("dagger"), Team::SHARDED, Vec2::ZERO)
    }

    #[test]
    fn test_velocity_clamped_before_move() {
        let mut world = World::new(Floor::plain("stone"));
        let mut unit = ground_unit();
        unit.velocity = Vec2::new(30.0, 40.0);
        world.step(&mut unit, 1.0, 0.0, 5.0);
        assert!((unit.position() - Vec2::new(3.0, 4.0)).length() < 1e-5);
        assert!((unit.velocity.length() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_mass_divides_movement() {
        let mut world = World::new(Floor::plain("stone"));
        let mut unit = Unit::new(
            1,
            UnitType {
                mass: 2.0,
                ..UnitType::ground("mace")
            },
            Team::SHARDED,
            Vec2::ZERO,
        );
        unit.velocity = Vec2::new(4.0, 0.0);
        world.step(&mut unit, 1.0, 0.0, 10.0);
        assert_eq!(unit.position(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_drag_decays_velocity_without_inverting() {
        let mut world = World::new(Floor::plain("stone"));
        let mut unit = ground_unit();
        unit.velocity = Vec2::new(2.0, 0.0);
        world.step(&mut unit, 1.0, 0.5, 10.0);
        assert_eq!(unit.velocity, Vec2::new(1.0, 0.0));
        world.step(&mut unit, 10.0, 0.5, 10.0);
        assert_eq!(unit.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_drowning_fills_and_kills() {
        let mut world = World::new(deep_water());
        let mut unit = ground_unit();
        for _ in 0..7 {
            world.step(&mut unit, 1.0, 0.1, 5.0);
            assert!(!unit.is_dead());
        }
        assert_eq!(unit.drown_time, 0.875);
        world.step(&mut unit, 1.0, 0.1, 5.0);
        assert!(unit.is_dead());
        assert!(unit.body.health <= 0.0);
        assert_eq!(unit.drown_time, 0.0);
        assert!(unit.status.is_empty());
        assert_eq!(unit.hit_time, 0.0, "drowning must not flash");
    }

    #[test]
    fn test_drown_progress_recovers_on_land() {
        let mut world = World::new(Floor::plain("stone"));
        let mut unit = ground_unit();
        unit.drown_time = 0.5;
        world.step(&mut unit, 1.0, 0.1, 5.0);
        assert!((unit.drown_time - 0.485).abs() < 1e-6);
    }

    #[test]
    fn test_drown_effect_rate_limited() {
        let mut world = World::new(Floor {
            drown_time: 1000.0,
            ..deep_water()
        });
        let mut unit = ground_unit();
        for _ in 0..30 {
            world.step(&mut unit, 1.0, 0.1, 5.0);
        }
        assert_eq!(world.effects.count(&fx::BUBBLE), 2);
        assert!(world
            .effects
            .effects
            .iter()
            .all(|e| e.color != Color::WHITE));
    }

    #[test]
    fn test_splash_only_when_moving_fast_enough() {
        let mut world = World::new(Floor {
            drown_time: 0.0,
            ..deep_water()
        });
        let mut unit = ground_unit();
        for _ in 0..40 {
            unit.velocity = Vec2::new(0.3, 0.0);
            world.step(&mut unit, 1.0, 0.0, 5.0);
        }
        assert_eq!(world.effects.count(&fx::RIPPLE), 0);

        for _ in 0..40 {
            unit.velocity = Vec2::new(2.0, 0.0);
            world.step(&mut unit, 1.0, 0.0, 5.0);
        }
        // interval = 14 - 2 * 0.2 * 2 = 13.2 ticks, so it fires every 14th tick
        assert_eq!(world.effects.count(&fx::RIPPLE), 2);
    }

    #[test]
    fn test_contact_status_applied_and_slows() {
        let mut world = World::new(Floor {
            drown_time: 0.0,
            ..deep_water()
        });
        let mut unit = ground_unit();
        world.step(&mut unit, 1.0, 0.0, 5.0);
        assert!(unit.status.has(&StatusId::from_static("wet")));

        unit.velocity = Vec2::new(1.0, 0.0);
        let before = unit.position();
        world.step(&mut unit, 1.0, 0.0, 5.0);
        let moved = unit.position().x - before.x;
        assert!((moved - 0.2 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_floor_damage_periodic_flash() {
        let mut world = World::new(Floor {
            damage_per_tick: 0.5,
            ..Floor::plain("slag")
        });
        let mut unit = ground_unit();
        for _ in 0..19 {
            world.step(&mut unit, 1.0, 0.1, 5.0);
        }
        assert!((unit.body.health - (100.0 - 19.0 * 0.5)).abs() < 1e-4);
        assert_eq!(unit.hit_time, 0.0);
        world.step(&mut unit, 1.0, 0.1, 5.0);
        assert_eq!(unit.hit_time, HIT_DURATION);
    }

    #[test]
    fn test_flying_ignores_floor() {
        let mut world = World::new(Floor {
            damage_per_tick: 5.0,
            ..deep_water()
        });
        let mut unit = Unit::new(1, UnitType::air("flare"), Team::SHARDED, Vec2::ZERO);
        unit.velocity = Vec2::new(1.0, 0.0);
        for _ in 0..50 {
            world.step(&mut unit, 1.0, 0.0, 5.0);
        }
        assert_eq!(unit.drown_time, 0.0);
        assert_eq!(unit.body.health, 100.0);
        assert!(unit.status.is_empty());
        assert!(world.effects.is_empty());
        assert_eq!(unit.position(), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_damage_flash_and_death_hook() {
        let mut unit = ground_unit();
        unit.drown_time = 0.4;
        assert!(!unit.damage(10.0));
        assert_eq!(unit.hit_time, HIT_DURATION);
        assert!(unit.damage_with_effect(1000.0, false));
        assert_eq!(unit.drown_time, 0.0);
    }

    #[test]
    fn test_update_counts_down_hit_flash() {
        let mut world = World::new(Floor::plain("stone"));
        let mut unit = ground_unit();
        unit.damage(1.0);
        let mut ctx = UnitContext {
            delta: 4.0,
            terrain: &world.terrain,
            collider: &NoCollision,
            statuses: &world.statuses,
            timers: &mut world.timers,
            effects: &mut world.effects,
        };
        unit.update(&mut ctx);
        assert_eq!(unit.hit_time, HIT_DURATION - 4.0);
    }

    #[test]
    fn test_impulse_scaled_by_mass() {
        let mut unit = Unit::new(
            1,
            UnitType {
                mass: 4.0,
                ..UnitType::ground("fortress")
            },
            Team::SHARDED,
            Vec2::ZERO,
        );
        unit.impulse(Vec2::new(8.0, 0.0));
        assert_eq!(unit.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_collides_only_with_enemies() {
        let unit = ground_unit();
        assert!(unit.collides_with(Team::CRUX));
        assert!(!unit.collides_with(Team::SHARDED));
    }

    #[test]
    fn test_status_kill_skips_rest_of_tick() {
        let mut world = World::new(deep_water());
        let mut unit = ground_unit();
        unit.status
            .apply_from_contact(&world.statuses, Some(&StatusId::from_static("melting")), 1.0);
        unit.body.health = 10.0;
        unit.drown_time = 0.5;
        unit.velocity = Vec2::new(2.0, 0.0);

        world.step(&mut unit, 1.0, 0.1, 5.0);
        assert!(unit.is_dead());
        assert_eq!(unit.body.health, -40.0);
        assert_eq!(unit.drown_time, 0.0);
        assert!(unit.status.is_empty());
        assert_eq!(unit.position(), Vec2::ZERO);
        assert_eq!(unit.velocity, Vec2::new(2.0, 0.0));
        assert!(world.effects.is_empty());

        world.step(&mut unit, 1.0, 0.1, 5.0);
        assert_eq!(unit.body.health, -40.0);
        assert!(!unit.status.has(&StatusId::from_static("wet")));
        assert_eq!(unit.position(), Vec2::ZERO);
    }

    #[test]
    fn test_flying_drag_ignores_floor_multiplier() {
        let mut world = World::new(Floor {
            drag_multiplier: 3.0,
            ..Floor::plain("tar")
        });
        let mut unit = Unit::new(1, UnitType::air("flare"), Team::SHARDED, Vec2::ZERO);
        unit.velocity = Vec2::new(4.0, 0.0);
        world.step(&mut unit, 0.5, 0.2, 10.0);
        assert!((unit.velocity.x - 3.6).abs() < 1e-6);
        assert_eq!(unit.position(), Vec2::new(4.0, 0.0));

        world.step(&mut unit, 2.0, 0.8, 10.0);
        assert_eq!(unit.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_teleport_keeps_velocity() {
        let mut unit = ground_unit();
        unit.velocity = Vec2::new(1.0, 1.0);
        unit.teleport(Vec2::new(64.0, -8.0));
        assert_eq!(unit.position(), Vec2::new(64.0, -8.0));
        assert_eq!(unit.velocity, Vec2::new(1.0, 1.0));
        assert!(!unit.is_dead());
    }
}
