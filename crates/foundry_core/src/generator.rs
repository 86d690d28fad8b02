//! Power generators with a warm-up curve and a destructive failure mode.
//!
//! A generator spins up while its item consumption is satisfied and spins
//! down (faster) while it is not. Output follows `warmup^5`, so a generator
//! contributes almost nothing until it is nearly at full warm-up. Destroying
//! a generator that was running hot sets off an explosion.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::economy::{ConsumeItems, ConsumptionValidator};
use crate::effects::{fx, AreaDamage, EffectRequest, EffectSink, Shake};
use crate::entity::Team;
use crate::error::{Result, SimError};
use crate::ids::{EffectId, EntityId, GeneratorTypeId};
use crate::math::{lerp_delta, random_offset, random_range, Vec2};
use crate::persistence::{Persist, SaveReader, SaveWriter};
use crate::structure::Structure;
use crate::terrain::TileOccupancy;
use crate::timer::{TimerKey, Timers};

/// Per-tick smoothing toward zero warm-up while starved.
pub const COOLDOWN_SPEED: f32 = 0.01;
/// Exponent of the warm-up to efficiency curve.
pub const EFFICIENCY_EXPONENT: i32 = 5;
/// Minimum warm-up at destruction for an explosion.
pub const EXPLOSION_WARMUP_THRESHOLD: f32 = 0.4;

const SHAKE_INTENSITY: f32 = 6.0;
const SHAKE_DURATION: f32 = 16.0;

/// One staggered burst of cosmetic effects after an explosion.
struct Burst {
    effect: EffectId,
    count: usize,
    max_delay: f32,
    max_offset: f32,
}

const BURSTS: [Burst; 3] = [
    Burst {
        effect: fx::IMPACT_CLOUD,
        count: 6,
        max_delay: 80.0,
        max_offset: 0.0,
    },
    Burst {
        effect: fx::EXPLOSION,
        count: 20,
        max_delay: 80.0,
        max_offset: 40.0,
    },
    Burst {
        effect: fx::IMPACT_SMOKE,
        count: 70,
        max_delay: 90.0,
        max_offset: 120.0,
    },
];

/// Data definition of a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorType {
    /// Unique id.
    pub id: GeneratorTypeId,
    /// Footprint edge length in tiles.
    #[serde(default = "default_size")]
    pub size: u8,
    /// Maximum health.
    #[serde(default = "default_health")]
    pub health: f32,
    /// Power per tick at full efficiency.
    #[serde(default = "default_power_production")]
    pub power_production: f32,
    /// Per-tick smoothing toward full warm-up while supplied.
    #[serde(default = "default_warmup_speed")]
    pub warmup_speed: f32,
    /// Fuel requirement.
    pub consumes: ConsumeItems,
    /// Explosion radius in tiles.
    #[serde(default = "default_explosion_radius")]
    pub explosion_radius: f32,
    /// Base explosion damage. The blast deals four times this at its center.
    #[serde(default = "default_explosion_damage")]
    pub explosion_damage: f32,
}

fn default_size() -> u8 {
    4
}
fn default_health() -> f32 {
    1900.0
}
fn default_power_production() -> f32 {
    2.0
}
fn default_warmup_speed() -> f32 {
    0.001
}
fn default_explosion_radius() -> f32 {
    30.0
}
fn default_explosion_damage() -> f32 {
    180.0
}

impl GeneratorType {
    /// Generator type with default stats burning `consumes`.
    #[must_use]
    pub fn new(id: impl Into<String>, consumes: ConsumeItems) -> Self {
        Self {
            id: GeneratorTypeId::new(id),
            size: default_size(),
            health: default_health(),
            power_production: default_power_production(),
            warmup_speed: default_warmup_speed(),
            consumes,
            explosion_radius: default_explosion_radius(),
            explosion_damage: default_explosion_damage(),
        }
    }
}

/// World access for one generator update.
pub struct GeneratorContext<'a> {
    /// Tick delta (1.0 = one 60 Hz frame).
    pub delta: f32,
    /// Item checks and removal.
    pub consumption: &'a mut dyn ConsumptionValidator,
    /// Per-actor timers.
    pub timers: &'a mut Timers,
}

/// World access for generator destruction.
pub struct DestroyContext<'a> {
    /// World units per tile.
    pub tile_size: f32,
    /// Tile occupancy store.
    pub occupancy: &'a mut dyn TileOccupancy,
    /// Effect and damage requests.
    pub effects: &'a mut dyn EffectSink,
    /// Randomness for the cosmetic scatter.
    pub rng: &'a mut dyn RngCore,
}

/// What happened when a generator was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detonation {
    /// Whether the generator exploded.
    pub exploded: bool,
    /// Cosmetic effects enqueued.
    pub scheduled: usize,
    /// Cosmetic effects the sink refused.
    pub dropped: usize,
}

/// A placed generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorBlock {
    /// Base structure state.
    pub structure: Structure,
    /// Type definition.
    pub kind: GeneratorType,
    /// Warm-up in `[0, 1]`. Persisted.
    pub warmup: f32,
    /// `warmup^5`, recomputed every tick. Not persisted.
    pub production_efficiency: f32,
    /// Power produced over the generator's lifetime.
    pub total_produced: f32,
}

impl GeneratorBlock {
    /// A freshly placed generator, cold.
    #[must_use]
    pub fn new(
        id: EntityId,
        kind: GeneratorType,
        team: Team,
        tile: (i32, i32),
        center: Vec2,
    ) -> Self {
        Self {
            structure: Structure::new(id, team, tile, kind.size, center, kind.health),
            kind,
            warmup: 0.0,
            production_efficiency: 0.0,
            total_produced: 0.0,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.structure.body.id
    }

    /// World center.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.structure.body.position
    }

    /// Whether the generator has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.structure.body.is_dead()
    }

    /// Advance one tick. Returns the power produced this tick.
    pub fn update(&mut self, ctx: &mut GeneratorContext<'_>) -> f32 {
        if self.is_destroyed() {
            return 0.0;
        }

        let id = self.id();
        let requirement = &self.kind.consumes;

        if ctx.consumption.consumption_satisfied(id, requirement) {
            self.warmup = lerp_delta(self.warmup, 1.0, self.kind.warmup_speed, ctx.delta);

            if ctx
                .timers
                .get(id, TimerKey::ConsumeItems, requirement.use_time, ctx.delta)
            {
                ctx.consumption
                    .remove_resource(id, &requirement.item, requirement.amount);
            }
        } else {
            self.warmup = lerp_delta(self.warmup, 0.0, COOLDOWN_SPEED, ctx.delta);
        }

        self.production_efficiency = self.warmup.powi(EFFICIENCY_EXPONENT);

        self.produce(ctx.delta)
    }

    /// Base generator bookkeeping: output scaled by efficiency.
    fn produce(&mut self, delta: f32) -> f32 {
        let produced = self.kind.power_production * self.production_efficiency * delta;
        self.total_produced += produced;
        produced
    }

    /// Destroy the generator.
    ///
    /// Runs the base structure destruction first. A generator at or above
    /// [`EXPLOSION_WARMUP_THRESHOLD`] then shakes the camera, plays a
    /// shockwave, damages everything in its blast radius and schedules the
    /// cosmetic aftermath. Refused cosmetic requests are dropped; they never
    /// interrupt the sequence.
    pub fn on_destroyed(&mut self, ctx: &mut DestroyContext<'_>) -> Detonation {
        self.structure.on_destroyed(&mut *ctx.occupancy);

        if self.warmup < EXPLOSION_WARMUP_THRESHOLD {
            return Detonation::default();
        }

        let center = self.position();
        tracing::info!(
            generator = self.id(),
            warmup = self.warmup,
            x = center.x,
            y = center.y,
            "Generator exploded"
        );

        ctx.effects.shake(Shake {
            intensity: SHAKE_INTENSITY,
            duration: SHAKE_DURATION,
            position: center,
        });
        ctx.effects.effect(EffectRequest::at(fx::IMPACT_SHOCKWAVE, center));
        ctx.effects.area_damage(AreaDamage {
            position: center,
            radius: self.kind.explosion_radius * ctx.tile_size,
            amount: self.kind.explosion_damage * 4.0,
        });

        let mut detonation = Detonation {
            exploded: true,
            ..Detonation::default()
        };
        for burst in &BURSTS {
            for _ in 0..burst.count {
                let delay = random_range(&mut *ctx.rng, burst.max_delay);
                let position = center + random_offset(&mut *ctx.rng, burst.max_offset);
                match ctx
                    .effects
                    .schedule(delay, EffectRequest::at(burst.effect.clone(), position))
                {
                    Ok(()) => detonation.scheduled += 1,
                    Err(err) => {
                        detonation.dropped += 1;
                        tracing::warn!(generator = self.id(), %err, "Dropped explosion effect");
                    }
                }
            }
        }
        detonation
    }
}

impl Persist for GeneratorBlock {
    fn write_state(&self, writer: &mut SaveWriter) -> Result<()> {
        self.structure.write_state(writer)?;
        writer.write_f32(self.warmup)
    }

    fn read_state(&mut self, reader: &mut SaveReader<'_>) -> Result<()> {
        let mut structure = self.structure.clone();
        structure.read_state(reader)?;
        let warmup = reader.read_f32()?;
        if !(0.0..=1.0).contains(&warmup) {
            return Err(SimError::Persistence(format!(
                "Generator {} has warmup {warmup} outside [0, 1]",
                self.id()
            )));
        }
        self.structure = structure;
        self.warmup = warmup;
        Ok(())
    }
}
