//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::ids::FloorId;
use crate::terrain::DEFAULT_TILE_SIZE;

/// Static parameters of a simulation run.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     delta: 1.0,
///     seed: 42,
///     width: 64,
///     height: 64,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Tick delta passed to every update (1.0 = one 60 Hz frame).
    #[serde(default = "default_delta")]
    pub delta: f32,
    /// Seed of the simulation RNG.
    #[serde(default)]
    pub seed: u64,
    /// Map width in tiles.
    #[serde(default = "default_extent")]
    pub width: u32,
    /// Map height in tiles.
    #[serde(default = "default_extent")]
    pub height: u32,
    /// World units per tile edge.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Floor filling the map and used outside it.
    #[serde(default = "default_floor")]
    pub default_floor: FloorId,
    /// Maximum pending delayed effects.
    #[serde(default = "default_effect_capacity")]
    pub effect_queue_capacity: usize,
}

fn default_delta() -> f32 {
    1.0
}
fn default_extent() -> u32 {
    64
}
fn default_tile_size() -> f32 {
    DEFAULT_TILE_SIZE
}
fn default_floor() -> FloorId {
    FloorId::from_static("stone")
}
fn default_effect_capacity() -> usize {
    4096
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            delta: default_delta(),
            seed: 0,
            width: default_extent(),
            height: default_extent(),
            tile_size: default_tile_size(),
            default_floor: default_floor(),
            effect_queue_capacity: default_effect_capacity(),
        }
    }
}

impl SimConfig {
    /// Parse a RON config document.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| SimError::DataParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.delta >= 0.0 && self.delta.is_finite()) {
            return Err(SimError::InvalidState(format!(
                "tick delta must be finite and non-negative, got {}",
                self.delta
            )));
        }
        if self.tile_size <= 0.0 {
            return Err(SimError::InvalidState(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidState("map must not be empty".to_string()));
        }
        Ok(())
    }

    /// Builder method to set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the map size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
