//! Headless scenario runner for CI verification and tuning.
//!
//! Loads a [`Scenario`] (floors, units, generators and forced destructions),
//! drives the simulation without any presentation layer and reports a
//! [`RunSummary`]. Logs go to stderr; the summary goes to stdout as text or
//! JSON.
//!
//! # Example
//!
//! ```bash
//! # Run the built-in meltdown scenario
//! cargo run -p foundry_headless
//!
//! # Run a scenario file with extra content, as JSON
//! cargo run -p foundry_headless -- --scenario river.ron --content mods.ron --json
//!
//! # Verify determinism across five runs
//! cargo run -p foundry_headless -- --verify 5
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{verify_determinism, HeadlessConfig, HeadlessRunner, RunSummary};
pub use scenario::{
    FloorPatch, GeneratorPlacement, PreparedScenario, Scenario, ScenarioError, UnitPlacement,
};
