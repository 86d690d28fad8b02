//! Rate limiting for periodic effects.
//!
//! A timer accumulates tick delta and fires once when the accumulated time
//! reaches its interval, then resets to zero. Excess time is dropped, so a
//! timer drifts slightly under large deltas instead of firing twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Purpose of a per-actor timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimerKey {
    /// Liquid walk splash effect.
    FloorEffect,
    /// Drowning bubble effect.
    DrownEffect,
    /// Hit flash on periodic floor damage.
    DamageEffect,
    /// Generator item consumption cadence.
    ConsumeItems,
}

/// A single accumulator for one owner and one purpose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    elapsed: f32,
}

impl Interval {
    /// Create a timer with nothing accumulated.
    #[must_use]
    pub const fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Advance by `delta` and report whether `interval` has elapsed.
    ///
    /// Fires at most once per call and resets to zero when it does.
    pub fn get(&mut self, interval: f32, delta: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed >= interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Time accumulated since the last firing.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

/// Timers for every (actor, purpose) pair.
///
/// Unknown pairs start at zero the first time they are queried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timers {
    timers: BTreeMap<(EntityId, TimerKey), Interval>,
}

impl Timers {
    /// Create an empty timer store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the `(actor, key)` timer by `delta` and report whether
    /// `interval` elapsed.
    pub fn get(&mut self, actor: EntityId, key: TimerKey, interval: f32, delta: f32) -> bool {
        self.timers
            .entry((actor, key))
            .or_default()
            .get(interval, delta)
    }

    /// Time accumulated on a timer, zero if it was never queried.
    #[must_use]
    pub fn elapsed(&self, actor: EntityId, key: TimerKey) -> f32 {
        self.timers
            .get(&(actor, key))
            .map_or(0.0, Interval::elapsed)
    }

    /// Drop every timer belonging to `actor`.
    pub fn forget(&mut self, actor: EntityId) {
        self.timers.retain(|(owner, _), _| *owner != actor);
    }

    /// Number of live timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timers exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Iterate over timers in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&(EntityId, TimerKey), &Interval)> {
        self.timers.iter()
    }
}
