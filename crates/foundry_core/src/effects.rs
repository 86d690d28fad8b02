//! Requests sent from the simulation to the effect and damage layers.
//!
//! The core never plays an effect itself. It describes what should happen and
//! where, and hands the request to an [`EffectSink`]. Delayed requests carry
//! only a captured position and color, never a reference back into the
//! simulation, so they stay valid after the entity that spawned them is gone.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::ids::EffectId;
use crate::math::{lerp, Vec2};

/// Built-in effect ids.
pub mod fx {
    use crate::ids::EffectId;

    /// Expanding ring when a reactor goes critical.
    pub const IMPACT_SHOCKWAVE: EffectId = EffectId::from_static("impact-shockwave");
    /// Lingering cloud after a reactor explosion.
    pub const IMPACT_CLOUD: EffectId = EffectId::from_static("impact-cloud");
    /// Smoke puffs scattered around a reactor explosion.
    pub const IMPACT_SMOKE: EffectId = EffectId::from_static("impact-smoke");
    /// Generic explosion.
    pub const EXPLOSION: EffectId = EffectId::from_static("explosion");
    /// Liquid splash under a walking unit.
    pub const RIPPLE: EffectId = EffectId::from_static("ripple");
    /// Bubbles over a drowning unit.
    pub const BUBBLE: EffectId = EffectId::from_static("bubble");
    /// No visible effect.
    pub const NONE: EffectId = EffectId::from_static("none");
}

/// RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white, the neutral tint.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Build a color from components.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let channel = |i: usize| -> Option<f32> {
            let byte = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
            Some(f32::from(byte) / 255.0)
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Play a cosmetic effect once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRequest {
    /// Effect to play.
    pub effect: EffectId,
    /// Tint.
    pub color: Color,
    /// World position.
    pub position: Vec2,
}

impl EffectRequest {
    /// Untinted request.
    #[must_use]
    pub fn at(effect: EffectId, position: Vec2) -> Self {
        Self {
            effect,
            color: Color::WHITE,
            position,
        }
    }

    /// Tinted request.
    #[must_use]
    pub fn tinted(effect: EffectId, color: Color, position: Vec2) -> Self {
        Self {
            effect,
            color,
            position,
        }
    }
}

/// Damage everything within a radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaDamage {
    /// Center in world units.
    pub position: Vec2,
    /// Radius in world units.
    pub radius: f32,
    /// Damage at the center.
    pub amount: f32,
}

impl AreaDamage {
    /// Fraction of damage kept at the rim.
    pub const FALLOFF: f32 = 0.4;

    /// Damage dealt to a target at `target`, or `None` if out of range.
    ///
    /// Scales linearly from full damage at the center down to
    /// [`Self::FALLOFF`] of it at the rim.
    #[must_use]
    pub fn damage_at(&self, target: Vec2) -> Option<f32> {
        let dist = self.position.distance(target);
        if dist > self.radius {
            return None;
        }
        let proximity = if self.radius > 0.0 {
            1.0 - dist / self.radius
        } else {
            1.0
        };
        Some(self.amount * lerp(proximity, 1.0, Self::FALLOFF))
    }
}

/// Screen shake around a world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shake {
    /// Shake magnitude.
    pub intensity: f32,
    /// Duration in ticks.
    pub duration: f32,
    /// Origin.
    pub position: Vec2,
}

/// Receiver of everything the simulation asks the outside world to do.
pub trait EffectSink {
    /// Play an effect now.
    fn effect(&mut self, request: EffectRequest);

    /// Apply area damage.
    fn area_damage(&mut self, damage: AreaDamage);

    /// Shake the camera.
    fn shake(&mut self, shake: Shake);

    /// Play an effect after `delay` ticks. Best effort: may be refused.
    fn schedule(&mut self, delay: f32, request: EffectRequest) -> Result<()>;
}

/// Sink that records requests in order.
#[derive(Debug, Clone, Default)]
pub struct EffectLog {
    /// Immediate effects.
    pub effects: Vec<EffectRequest>,
    /// Area damage requests.
    pub area_damage: Vec<AreaDamage>,
    /// Camera shakes.
    pub shakes: Vec<Shake>,
    /// Delayed effects with their delay.
    pub scheduled: Vec<(f32, EffectRequest)>,
}

impl EffectLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of immediate effects with the given id.
    #[must_use]
    pub fn count(&self, effect: &EffectId) -> usize {
        self.effects.iter().filter(|r| &r.effect == effect).count()
    }

    /// Number of scheduled effects with the given id.
    #[must_use]
    pub fn count_scheduled(&self, effect: &EffectId) -> usize {
        self.scheduled
            .iter()
            .filter(|(_, r)| &r.effect == effect)
            .count()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
            && self.area_damage.is_empty()
            && self.shakes.is_empty()
            && self.scheduled.is_empty()
    }
}

impl EffectSink for EffectLog {
    fn effect(&mut self, request: EffectRequest) {
        self.effects.push(request);
    }

    fn area_damage(&mut self, damage: AreaDamage) {
        self.area_damage.push(damage);
    }

    fn shake(&mut self, shake: Shake) {
        self.shakes.push(shake);
    }

    fn schedule(&mut self, delay: f32, request: EffectRequest) -> Result<()> {
        self.scheduled.push((delay, request));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pending {
    remaining: f32,
    sequence: u64,
    request: EffectRequest,
}

/// Bounded queue of delayed effect requests.
///
/// Requests come out of [`advance`](Self::advance) once their delay has
/// elapsed, ordered by due time and then by enqueue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEffects {
    pending: Vec<Pending>,
    capacity: usize,
    next_sequence: u64,
}

impl ScheduledEffects {
    /// Create a queue holding at most `capacity` pending requests.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::new(),
            capacity,
            next_sequence: 0,
        }
    }

    /// Enqueue `request` to fire after `delay` ticks.
    pub fn push(&mut self, delay: f32, request: EffectRequest) -> Result<()> {
        if self.pending.len() >= self.capacity {
            return Err(SimError::EffectQueueFull {
                capacity: self.capacity,
            });
        }
        self.pending.push(Pending {
            remaining: delay.max(0.0),
            sequence: self.next_sequence,
            request,
        });
        self.next_sequence += 1;
        Ok(())
    }

    /// Advance all delays by `delta` and drain the requests that are due.
    pub fn advance(&mut self, delta: f32) -> Vec<EffectRequest> {
        let mut due = Vec::new();
        let mut kept = Vec::with_capacity(self.pending.len());
        for mut pending in self.pending.drain(..) {
            pending.remaining -= delta;
            if pending.remaining <= 0.0 {
                due.push(pending);
            } else {
                kept.push(pending);
            }
        }
        self.pending = kept;

        due.sort_by(|a, b| {
            a.remaining
                .total_cmp(&b.remaining)
                .then(a.sequence.cmp(&b.sequence))
        });
        due.into_iter().map(|p| p.request).collect()
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Maximum number of pending requests.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
