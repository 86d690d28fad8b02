//! Headless scenario runner implementation.

use foundry_core::data::ContentRegistry;
use foundry_core::simulation::{Simulation, TickEvents};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scenario::{PreparedScenario, Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Ticks to run. Falls back to the scenario's own tick count.
    pub ticks: Option<u64>,
    /// Seed override.
    pub seed: Option<u64>,
}

/// Aggregated outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed the run used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// State hash after the last tick.
    pub final_hash: u64,
    /// Units alive at the end.
    pub units_alive: usize,
    /// Units that died.
    pub unit_deaths: usize,
    /// Structures destroyed.
    pub structures_destroyed: usize,
    /// Explosions, counted by area-damage requests.
    pub explosions: usize,
    /// Immediate effect requests.
    pub effects_requested: usize,
    /// Delayed effect requests that came due.
    pub deferred_effects: usize,
    /// Delayed effect requests the queue refused.
    pub dropped_effects: usize,
    /// Camera shakes requested.
    pub shakes: usize,
    /// Total power produced.
    pub power_produced: f32,
}

impl RunSummary {
    fn record(&mut self, events: &TickEvents) {
        self.unit_deaths += events.deaths.len();
        self.structures_destroyed += events.destroyed.len();
        self.explosions += events.area_damage.len();
        self.effects_requested += events.effects.len();
        self.deferred_effects += events.deferred.len();
        self.dropped_effects += events.dropped_effects;
        self.shakes += events.shakes.len();
        self.power_produced += events.power_produced;
    }
}

/// Runs one scenario to completion without any presentation layer.
#[derive(Debug)]
pub struct HeadlessRunner {
    name: String,
    ticks: u64,
    prepared: PreparedScenario,
}

impl HeadlessRunner {
    /// Build the scenario's world.
    pub fn new(
        scenario: &Scenario,
        content: ContentRegistry,
        config: &HeadlessConfig,
    ) -> Result<Self, ScenarioError> {
        Ok(Self {
            name: scenario.name.clone(),
            ticks: config.ticks.unwrap_or(scenario.ticks),
            prepared: scenario.prepare(content, config.seed)?,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.prepared.simulation
    }

    /// Run every tick and summarize.
    ///
    /// A forced destruction of a structure that is already gone is skipped.
    pub fn run(mut self) -> RunSummary {
        let mut summary = RunSummary {
            scenario: self.name.clone(),
            seed: self.prepared.simulation.config().seed,
            ticks: self.ticks,
            ..RunSummary::default()
        };

        let mut pending = self.prepared.destructions.iter().peekable();
        for tick in 0..self.ticks {
            while let Some(&(_, id)) = pending.next_if(|(at, _)| *at <= tick) {
                match self.prepared.simulation.destroy_structure(id) {
                    Ok(events) => summary.record(&events),
                    Err(err) => tracing::debug!(structure = id, %err, "Skipped forced destruction"),
                }
            }

            let events = self.prepared.simulation.tick();
            summary.record(&events);
        }

        let simulation = &self.prepared.simulation;
        summary.units_alive = simulation.units().count();
        summary.final_hash = simulation.state_hash();

        tracing::info!(
            scenario = %summary.scenario,
            ticks = summary.ticks,
            deaths = summary.unit_deaths,
            explosions = summary.explosions,
            hash = summary.final_hash,
            "Run complete"
        );

        summary
    }
}

/// Run a scenario `runs` times in parallel and check every run ends in the
/// same state.
pub fn verify_determinism(
    scenario: &Scenario,
    content: &ContentRegistry,
    config: &HeadlessConfig,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| {
            HeadlessRunner::new(scenario, content.clone(), config).map(|runner| runner.run().final_hash)
        })
        .collect::<Result<Vec<u64>, ScenarioError>>()?;

    let agreed = hashes.windows(2).all(|w| w[0] == w[1]);
    if !agreed {
        tracing::warn!(scenario = %scenario.name, ?hashes, "Runs diverged");
    }
    Ok(agreed)
}
