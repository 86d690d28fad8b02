//! Scenario loading and configuration.
//!
//! Scenarios define the initial world for headless runs: floors painted
//! over the default terrain, starting units, generators with their fuel and
//! warm-up, and optional forced destructions.

use std::path::Path;

use foundry_core::config::SimConfig;
use foundry_core::data::{ContentRegistry, BLAST_COMPOUND};
use foundry_core::entity::Team;
use foundry_core::error::SimError;
use foundry_core::ids::{EntityId, FloorId, GeneratorTypeId, ItemId, UnitTypeId};
use foundry_core::math::Vec2;
use foundry_core::simulation::Simulation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario does not fit the simulation or its content.
    #[error("Invalid scenario: {0}")]
    Simulation(#[from] SimError),
}

/// A rectangle of tiles painted with one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPatch {
    /// Floor id from the content registry.
    pub floor: String,
    /// First corner, in tiles.
    pub from: (i32, i32),
    /// Opposite corner, inclusive.
    pub to: (i32, i32),
}

/// Starting units of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit type id.
    pub kind: String,
    /// Owning team.
    #[serde(default = "default_team")]
    pub team: u8,
    /// World position of the first unit.
    pub position: (f32, f32),
    /// Initial push applied to each unit.
    #[serde(default)]
    pub impulse: (f32, f32),
    /// Number of units, placed in a row one tile apart.
    #[serde(default = "default_count")]
    pub count: u32,
}

impl UnitPlacement {
    /// Create a placement of `count` idle units.
    #[must_use]
    pub fn new(kind: &str, x: f32, y: f32, count: u32) -> Self {
        Self {
            kind: kind.to_string(),
            team: default_team(),
            position: (x, y),
            impulse: (0.0, 0.0),
            count,
        }
    }
}

/// A starting generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorPlacement {
    /// Generator type id.
    pub kind: String,
    /// Owning team.
    #[serde(default = "default_team")]
    pub team: u8,
    /// Anchor tile.
    pub tile: (i32, i32),
    /// Starting warm-up.
    #[serde(default)]
    pub warmup: f32,
    /// Items deposited at start.
    #[serde(default)]
    pub items: Vec<(String, u32)>,
    /// Tick at which the generator is destroyed.
    #[serde(default)]
    pub destroy_at: Option<u64>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Simulation settings.
    #[serde(default)]
    pub config: SimConfig,
    /// Ticks to run when the caller does not override it.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Floors painted in order over the default floor.
    #[serde(default)]
    pub floors: Vec<FloorPatch>,
    /// Wall tiles.
    #[serde(default)]
    pub walls: Vec<(i32, i32)>,
    /// Starting units.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Starting generators.
    #[serde(default)]
    pub generators: Vec<GeneratorPlacement>,
}

fn default_team() -> u8 {
    Team::SHARDED.0
}

fn default_count() -> u32 {
    1
}

fn default_ticks() -> u64 {
    600
}

impl Default for Scenario {
    fn default() -> Self {
        Self::reactor_meltdown()
    }
}

/// A built world plus the destructions it still has to carry out.
#[derive(Debug, Clone)]
pub struct PreparedScenario {
    /// The populated simulation.
    pub simulation: Simulation,
    /// Forced destructions as `(tick, structure)`, ordered by tick.
    pub destructions: Vec<(u64, EntityId)>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A fuelled reactor beside a flooded crossing, blown up once hot.
    ///
    /// Exercises wading, drowning, warm-up and the explosion aftermath.
    #[must_use]
    pub fn reactor_meltdown() -> Self {
        Self {
            name: "Reactor Meltdown".to_string(),
            description: "Units wade a river while a reactor warms up and fails".to_string(),
            config: SimConfig::default(),
            ticks: 1200,
            floors: vec![
                FloorPatch {
                    floor: "shallow-water".to_string(),
                    from: (0, 20),
                    to: (63, 30),
                },
                FloorPatch {
                    floor: "deep-water".to_string(),
                    from: (24, 23),
                    to: (40, 27),
                },
                FloorPatch {
                    floor: "slag".to_string(),
                    from: (50, 50),
                    to: (60, 60),
                },
            ],
            walls: vec![(10, 10), (11, 10), (12, 10)],
            units: vec![
                UnitPlacement {
                    impulse: (0.0, 1.0),
                    ..UnitPlacement::new("dagger", 200.0, 120.0, 6)
                },
                UnitPlacement {
                    impulse: (0.3, 0.6),
                    ..UnitPlacement::new("titan", 60.0, 140.0, 2)
                },
                UnitPlacement {
                    team: Team::CRUX.0,
                    impulse: (2.0, 1.0),
                    ..UnitPlacement::new("flare", 40.0, 40.0, 3)
                },
                UnitPlacement {
                    team: Team::CRUX.0,
                    ..UnitPlacement::new("dagger", 430.0, 430.0, 4)
                },
            ],
            generators: vec![GeneratorPlacement {
                kind: "impact-reactor".to_string(),
                team: Team::SHARDED.0,
                tile: (52, 40),
                warmup: 0.6,
                items: vec![(BLAST_COMPOUND.as_str().to_string(), 200)],
                destroy_at: Some(900),
            }],
        }
    }

    /// Build the simulation this scenario describes.
    pub fn prepare(
        &self,
        content: ContentRegistry,
        seed: Option<u64>,
    ) -> Result<PreparedScenario, ScenarioError> {
        let mut config = self.config.clone();
        if let Some(seed) = seed {
            config.seed = seed;
        }

        let mut simulation = Simulation::new(config, content)?;

        for patch in &self.floors {
            simulation.paint_floor(
                &FloorId::new(patch.floor.clone()),
                patch.from.0,
                patch.from.1,
                patch.to.0,
                patch.to.1,
            )?;
        }
        for &(x, y) in &self.walls {
            simulation.grid_mut().set_wall(x, y, true);
        }

        let step = simulation.config().tile_size;
        for placement in &self.units {
            let kind = UnitTypeId::new(placement.kind.clone());
            let impulse = Vec2::new(placement.impulse.0, placement.impulse.1);
            for i in 0..placement.count {
                let position =
                    Vec2::new(placement.position.0 + step * i as f32, placement.position.1);
                let id = simulation.spawn_unit(&kind, Team(placement.team), position)?;
                if let Some(unit) = simulation.unit_mut(id) {
                    unit.impulse(impulse);
                }
            }
        }

        let mut destructions = Vec::new();
        for placement in &self.generators {
            let id = simulation.place_generator(
                &GeneratorTypeId::new(placement.kind.clone()),
                Team(placement.team),
                placement.tile,
            )?;
            for (item, amount) in &placement.items {
                simulation
                    .items_mut()
                    .add(id, ItemId::new(item.clone()), *amount);
            }
            if let Some(generator) = simulation.generator_mut(id) {
                generator.warmup = placement.warmup.clamp(0.0, 1.0);
            }
            if let Some(tick) = placement.destroy_at {
                destructions.push((tick, id));
            }
        }
        destructions.sort_unstable();

        tracing::debug!(
            scenario = %self.name,
            units = simulation.units().count(),
            generators = simulation.generators().count(),
            "Prepared scenario"
        );

        Ok(PreparedScenario {
            simulation,
            destructions,
        })
    }
}
