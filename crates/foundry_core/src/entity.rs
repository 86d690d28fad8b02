//! Shared simulated-entity state.
//!
//! Units and structures both embed a [`Body`] rather than inheriting from a
//! common base. The body owns health and the damage/death contract; the
//! embedding type reacts to the death transition reported by [`Body::damage`].

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::math::Vec2;

/// Faction identifier used by hostility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Team(pub u8);

impl Team {
    /// Environment team: owns nothing and is hostile to nobody.
    pub const DERELICT: Self = Self(0);
    /// Default player team.
    pub const SHARDED: Self = Self(1);
    /// Default opposing team.
    pub const CRUX: Self = Self(2);

    /// Check whether two teams are hostile to each other.
    #[must_use]
    pub const fn is_enemy_of(self, other: Self) -> bool {
        self.0 != other.0 && self.0 != Self::DERELICT.0 && other.0 != Self::DERELICT.0
    }
}

impl Default for Team {
    fn default() -> Self {
        Self::SHARDED
    }
}

/// Position, health and liveness shared by every simulated entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Unique identifier.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// World position.
    pub position: Vec2,
    /// Current health. May go negative on the killing blow.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    dead: bool,
}

impl Body {
    /// Create a body at full health.
    #[must_use]
    pub fn new(id: EntityId, team: Team, position: Vec2, max_health: f32) -> Self {
        Self {
            id,
            team,
            position,
            health: max_health,
            max_health,
            dead: false,
        }
    }

    /// Whether the death transition has happened.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Reduce health by `amount`.
    ///
    /// Returns `true` exactly once: on the call that takes health to zero or
    /// below. Damage to an already dead body is ignored.
    pub fn damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.dead = true;
            return true;
        }
        false
    }

    /// Restore health, capped at maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead {
            return 0.0;
        }
        let actual = amount.min(self.max_health - self.health).max(0.0);
        self.health += actual;
        actual
    }

    /// Force the death transition without touching health.
    ///
    /// Returns `false` if the body was already dead.
    pub fn kill(&mut self) -> bool {
        !std::mem::replace(&mut self.dead, true)
    }

    /// Overwrite health from persisted state.
    ///
    /// A value at or below zero runs the death transition, so the owner
    /// processes the death on its next update.
    pub fn restore_health(&mut self, health: f32) {
        self.health = health;
        if health <= 0.0 {
            self.dead = true;
        }
    }
}
