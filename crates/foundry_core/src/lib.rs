//! # Foundry Core
//!
//! Deterministic simulation core for a factory/strategy game world.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond byte buffers
//! - No system randomness (a seeded RNG lives in the simulation)
//!
//! Presentation is requested through [`effects::EffectSink`]: the core
//! asks for effects, shakes and area damage and never draws anything.
//!
//! ## Crate Structure
//!
//! - [`unit`] - Mobile units: velocity, drag, floor interaction, drowning
//! - [`status`] - Timed status effects applied to units
//! - [`generator`] - Power generators: warm-up, consumption, explosions
//! - [`terrain`] - Tile grid, floors and collision
//! - [`data`] - RON content definitions
//! - [`simulation`] - Core simulation loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod data;
pub mod economy;
pub mod effects;
pub mod entity;
pub mod error;
pub mod generator;
pub mod ids;
pub mod math;
pub mod persistence;
pub mod simulation;
pub mod status;
pub mod structure;
pub mod terrain;
pub mod timer;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::data::{status_ids, ContentData, ContentRegistry, BLAST_COMPOUND};
    pub use crate::economy::{ConsumeItems, ConsumptionValidator, ItemLedger};
    pub use crate::effects::{
        fx, AreaDamage, Color, EffectLog, EffectRequest, EffectSink, ScheduledEffects, Shake,
    };
    pub use crate::entity::{Body, Team};
    pub use crate::error::{Result, SimError};
    pub use crate::generator::{GeneratorBlock, GeneratorType};
    pub use crate::ids::{
        EffectId, EntityId, FloorId, GeneratorTypeId, ItemId, StatusId, UnitTypeId,
    };
    pub use crate::math::Vec2;
    pub use crate::persistence::{Persist, SaveReader, SaveWriter};
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::status::{StatusController, StatusEffectDef, StatusKind, StatusRegistry};
    pub use crate::terrain::{Collider, Floor, TerrainQuery, TileGrid};
    pub use crate::timer::{TimerKey, Timers};
    pub use crate::unit::{Unit, UnitType};
}
