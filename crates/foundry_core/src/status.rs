//! Timed status effects.
//!
//! Effects are data: a [`StatusEffectDef`] pairs an id with a base duration and
//! a [`StatusKind`] describing what the effect does each tick. The
//! [`StatusController`] owned by each unit only tracks remaining time and
//! intensity per active id and dispatches to the kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Body;
use crate::ids::StatusId;
use crate::math::{clamp01, Vec2};

/// Per-tick behavior of a status effect.
///
/// Per-tick payloads are multiplied by the active intensity and the tick
/// delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Lose health every tick, without a hit flash.
    Damage {
        /// Health lost per tick at intensity 1.
        per_tick: f32,
    },
    /// Regain health every tick.
    Heal {
        /// Health restored per tick at intensity 1.
        per_tick: f32,
    },
    /// Bleed off velocity every tick.
    Drag {
        /// Fraction of velocity removed per tick at intensity 1.
        per_tick: f32,
    },
    /// Scale derived movement stats while active.
    Modifiers {
        /// Multiplier applied to movement speed.
        speed_multiplier: f32,
    },
    /// Several behaviors at once.
    Composite(Vec<StatusKind>),
}

impl StatusKind {
    /// Run one tick of this behavior. Returns `true` if it killed the owner.
    fn apply(
        &self,
        intensity: f32,
        target: &mut StatusTarget<'_>,
        modifiers: &mut StatusModifiers,
        delta: f32,
    ) -> bool {
        match self {
            Self::Damage { per_tick } => target.body.damage(per_tick * intensity * delta),
            Self::Heal { per_tick } => {
                target.body.heal(per_tick * intensity * delta);
                false
            }
            Self::Drag { per_tick } => {
                *target.velocity *= clamp01(1.0 - per_tick * intensity * delta);
                false
            }
            Self::Modifiers { speed_multiplier } => {
                modifiers.speed_multiplier *= speed_multiplier;
                false
            }
            Self::Composite(kinds) => kinds.iter().fold(false, |killed, kind| {
                kind.apply(intensity, target, modifiers, delta) || killed
            }),
        }
    }
}

/// Data definition of a status effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectDef {
    /// Unique id.
    pub id: StatusId,
    /// Duration installed on first application and on every refresh, in ticks.
    pub duration: f32,
    /// Behavior while active.
    pub kind: StatusKind,
}

/// All known status effect definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRegistry {
    effects: BTreeMap<StatusId, StatusEffectDef>,
}

impl StatusRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a definition.
    pub fn register(&mut self, def: StatusEffectDef) {
        self.effects.insert(def.id.clone(), def);
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, id: &StatusId) -> Option<&StatusEffectDef> {
        self.effects.get(id)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl FromIterator<StatusEffectDef> for StatusRegistry {
    fn from_iter<T: IntoIterator<Item = StatusEffectDef>>(iter: T) -> Self {
        let mut registry = Self::new();
        for def in iter {
            registry.register(def);
        }
        registry
    }
}

/// Mutable owner state a status effect may touch.
pub struct StatusTarget<'a> {
    /// Health and death contract.
    pub body: &'a mut Body,
    /// Owner velocity.
    pub velocity: &'a mut Vec2,
}

/// Stats derived from the active effects, recomputed on every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusModifiers {
    /// Multiplier on movement speed.
    pub speed_multiplier: f32,
}

impl Default for StatusModifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
        }
    }
}

/// An effect currently applied to an owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveStatus {
    /// Ticks left before expiry. Always positive while stored.
    pub remaining: f32,
    /// Payload scale.
    pub intensity: f32,
}

/// Result of one controller update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    /// An effect took the owner's health to zero this tick.
    pub killed: bool,
    /// Number of effects that expired this tick.
    pub expired: usize,
}

/// Active status effects of a single owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusController {
    active: BTreeMap<StatusId, ActiveStatus>,
    modifiers: StatusModifiers,
}

impl StatusController {
    /// Create a controller with no active effects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every active effect by `delta`.
    ///
    /// Expired effects are removed before they act; the rest run their
    /// per-tick behavior against `target`. Derived modifiers are rebuilt from
    /// the survivors.
    pub fn update(
        &mut self,
        registry: &StatusRegistry,
        target: &mut StatusTarget<'_>,
        delta: f32,
    ) -> StatusUpdate {
        let mut modifiers = StatusModifiers::default();
        let mut result = StatusUpdate::default();

        self.active.retain(|id, active| {
            active.remaining -= delta;
            if active.remaining <= 0.0 {
                result.expired += 1;
                return false;
            }
            if let Some(def) = registry.get(id) {
                if def.kind.apply(active.intensity, target, &mut modifiers, delta) {
                    result.killed = true;
                }
            }
            true
        });

        self.modifiers = modifiers;
        result
    }

    /// Apply the effect a floor inflicts on contact.
    ///
    /// `None` is a no-op. A new effect is installed with its full duration; an
    /// active one has its duration refreshed and takes the new intensity.
    pub fn apply_from_contact(
        &mut self,
        registry: &StatusRegistry,
        effect: Option<&StatusId>,
        intensity: f32,
    ) {
        let Some(id) = effect else {
            return;
        };
        let Some(def) = registry.get(id) else {
            tracing::warn!(status = %id, "Contact status is not registered");
            return;
        };
        if def.duration <= 0.0 {
            return;
        }

        let fresh = ActiveStatus {
            remaining: def.duration,
            intensity,
        };
        if self.active.insert(id.clone(), fresh).is_none() {
            tracing::trace!(status = %id, intensity, "Status applied");
        }
    }

    /// Remove every active effect and reset derived modifiers.
    pub fn clear(&mut self) {
        self.active.clear();
        self.modifiers = StatusModifiers::default();
    }

    /// Whether `id` is active.
    #[must_use]
    pub fn has(&self, id: &StatusId) -> bool {
        self.active.contains_key(id)
    }

    /// Remaining duration of `id`, if active.
    #[must_use]
    pub fn remaining(&self, id: &StatusId) -> Option<f32> {
        self.active.get(id).map(|a| a.remaining)
    }

    /// Active entry for `id`.
    #[must_use]
    pub fn get(&self, id: &StatusId) -> Option<&ActiveStatus> {
        self.active.get(id)
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Modifiers derived on the last update.
    #[must_use]
    pub const fn modifiers(&self) -> StatusModifiers {
        self.modifiers
    }

    /// Iterate over active effects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&StatusId, &ActiveStatus)> {
        self.active.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Team;

    fn registry() -> StatusRegistry {
        [
            StatusEffectDef {
                id: StatusId::from_static("burning"),
                duration: 10.0,
                kind: StatusKind::Damage { per_tick: 2.0 },
            },
            StatusEffectDef {
                id: StatusId::from_static("wet"),
                duration: 5.0,
                kind: StatusKind::Composite(vec![
                    StatusKind::Drag { per_tick: 0.5 },
                    StatusKind::Modifiers {
                        speed_multiplier: 0.9,
                    },
                ]),
            },
            StatusEffectDef {
                id: StatusId::from_static("mending"),
                duration: 5.0,
                kind: StatusKind::Heal { per_tick: 1.0 },
            },
        ]
        .into_iter()
        .collect()
    }

    fn body(health: f32) -> Body {
        Body::new(1, Team::SHARDED, Vec2::ZERO, health)
    }

    #[test]
    fn test_none_is_noop() {
        let mut status = StatusController::new();
        status.apply_from_contact(&registry(), None, 1.0);
        assert!(status.is_empty());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut status = StatusController::new();
        status.apply_from_contact(&registry(), Some(&StatusId::from_static("cursed")), 1.0);
        assert!(status.is_empty());
    }

    #[test]
    fn test_reapply_refreshes_without_stacking() {
        let registry = registry();
        let burning = StatusId::from_static("burning");
        let mut status = StatusController::new();
        let mut b = body(100.0);
        let mut velocity = Vec2::ZERO;

        status.apply_from_contact(&registry, Some(&burning), 1.0);
        status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            4.0,
        );
        assert_eq!(status.remaining(&burning), Some(6.0));

        status.apply_from_contact(&registry, Some(&burning), 0.5);
        assert_eq!(status.len(), 1);
        assert_eq!(status.remaining(&burning), Some(10.0));
        assert_eq!(status.get(&burning).map(|a| a.intensity), Some(0.5));
    }

    #[test]
    fn test_expired_effect_is_removed_without_acting() {
        let registry = registry();
        let burning = StatusId::from_static("burning");
        let mut status = StatusController::new();
        let mut b = body(100.0);
        let mut velocity = Vec2::ZERO;
        status.apply_from_contact(&registry, Some(&burning), 1.0);

        let result = status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            10.0,
        );
        assert_eq!(result.expired, 1);
        assert!(!status.has(&burning));
        assert_eq!(b.health, 100.0);
    }

    #[test]
    fn test_damage_effect_reports_kill() {
        let registry = registry();
        let mut status = StatusController::new();
        let mut b = body(3.0);
        let mut velocity = Vec2::ZERO;
        status.apply_from_contact(&registry, Some(&StatusId::from_static("burning")), 1.0);

        let result = status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            2.0,
        );
        assert!(result.killed);
        assert!(b.is_dead());
    }

    #[test]
    fn test_composite_drags_and_modifies() {
        let registry = registry();
        let mut status = StatusController::new();
        let mut b = body(10.0);
        let mut velocity = Vec2::new(4.0, 0.0);
        status.apply_from_contact(&registry, Some(&StatusId::from_static("wet")), 1.0);

        status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            1.0,
        );
        assert_eq!(velocity, Vec2::new(2.0, 0.0));
        assert!((status.modifiers().speed_multiplier - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_heal_effect() {
        let registry = registry();
        let mut status = StatusController::new();
        let mut b = body(10.0);
        b.damage(5.0);
        let mut velocity = Vec2::ZERO;
        status.apply_from_contact(&registry, Some(&StatusId::from_static("mending")), 2.0);
        status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            1.0,
        );
        assert_eq!(b.health, 7.0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let registry = registry();
        let mut status = StatusController::new();
        let mut b = body(10.0);
        let mut velocity = Vec2::ZERO;
        status.apply_from_contact(&registry, Some(&StatusId::from_static("wet")), 1.0);
        status.apply_from_contact(&registry, Some(&StatusId::from_static("burning")), 1.0);
        status.update(
            &registry,
            &mut StatusTarget {
                body: &mut b,
                velocity: &mut velocity,
            },
            1.0,
        );

        status.clear();
        assert!(status.is_empty());
        assert_eq!(status.modifiers(), StatusModifiers::default());
    }
}
