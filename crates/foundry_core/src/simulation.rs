//! Core simulation loop.
//!
//! The simulation owns the world (tile grid, units, generators, item stock)
//! and advances it one tick at a time. Every actor is processed to completion
//! in ascending id order before the next one starts, and a tick fully
//! finishes before the next begins.
//!
//! # Determinism
//!
//! - Entities live in ordered maps, so iteration order is fixed
//! - The only randomness is a seeded ChaCha RNG owned by the simulation
//! - Same config, content and inputs always produce the same state hash
//!
//! # Example
//!
//! ```
//! use foundry_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default(), ContentRegistry::standard()).unwrap();
//! let dagger = sim
//!     .spawn_unit(&UnitTypeId::from_static("dagger"), Team::SHARDED, Vec2::new(40.0, 40.0))
//!     .unwrap();
//!
//! sim.unit_mut(dagger).unwrap().impulse(Vec2::new(1.0, 0.0));
//! sim.tick();
//! assert_eq!(sim.get_tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::data::ContentRegistry;
use crate::economy::ItemLedger;
use crate::effects::{AreaDamage, EffectRequest, EffectSink, ScheduledEffects, Shake};
use crate::entity::Team;
use crate::error::{Result, SimError};
use crate::generator::{DestroyContext, GeneratorBlock, GeneratorContext};
use crate::ids::{EntityId, FloorId, GeneratorTypeId, UnitTypeId};
use crate::math::Vec2;
use crate::persistence::{Persist, SaveReader, SaveWriter};
use crate::terrain::TileGrid;
use crate::timer::Timers;
use crate::unit::{Unit, UnitContext, UnitType};

/// Events generated during a simulation tick.
///
/// These are the requests the rendering, audio and damage layers act on.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Effects to play now.
    pub effects: Vec<EffectRequest>,
    /// Area damage applied this tick, in application order.
    pub area_damage: Vec<AreaDamage>,
    /// Camera shakes.
    pub shakes: Vec<Shake>,
    /// Delayed effects that came due this tick.
    pub deferred: Vec<EffectRequest>,
    /// Units that died this tick.
    pub deaths: Vec<EntityId>,
    /// Structures destroyed this tick.
    pub destroyed: Vec<EntityId>,
    /// Total power produced this tick.
    pub power_produced: f32,
    /// Delayed effects the queue refused.
    pub dropped_effects: usize,
}

/// Routes effect requests into tick events and the delayed queue.
struct TickSink<'a> {
    events: &'a mut TickEvents,
    scheduled: &'a mut ScheduledEffects,
}

impl EffectSink for TickSink<'_> {
    fn effect(&mut self, request: EffectRequest) {
        self.events.effects.push(request);
    }

    fn area_damage(&mut self, damage: AreaDamage) {
        self.events.area_damage.push(damage);
    }

    fn shake(&mut self, shake: Shake) {
        self.events.shakes.push(shake);
    }

    fn schedule(&mut self, delay: f32, request: EffectRequest) -> Result<()> {
        self.scheduled.push(delay, request)
    }
}

/// The world simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Units** - velocity, status effects, floor interaction, movement
/// 2. **Generators** - consumption, warm-up, power output
/// 3. **Destruction** - dead structures run their destruction hooks
/// 4. **Area damage** - blasts hit units and structures, chaining as needed
/// 5. **Cleanup** - dead units are removed
/// 6. **Delayed effects** - due requests are released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    tick: u64,
    config: SimConfig,
    content: ContentRegistry,
    grid: TileGrid,
    units: BTreeMap<EntityId, Unit>,
    generators: BTreeMap<EntityId, GeneratorBlock>,
    next_id: EntityId,
    timers: Timers,
    items: ItemLedger,
    scheduled: ScheduledEffects,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Create an empty world filled with the configured default floor.
    pub fn new(config: SimConfig, content: ContentRegistry) -> Result<Self> {
        config.validate()?;
        let default_floor = content.floor(&config.default_floor)?.clone();
        let grid = TileGrid::new(config.width, config.height, config.tile_size, default_floor);

        Ok(Self {
            tick: 0,
            grid,
            units: BTreeMap::new(),
            generators: BTreeMap::new(),
            next_id: 1,
            timers: Timers::new(),
            items: ItemLedger::new(),
            scheduled: ScheduledEffects::new(config.effect_queue_capacity),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            content,
            config,
        })
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Loaded content.
    #[must_use]
    pub const fn content(&self) -> &ContentRegistry {
        &self.content
    }

    /// The tile grid.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Mutable tile grid, for map setup.
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    /// Per-actor timers.
    #[must_use]
    pub const fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Structure inventories.
    #[must_use]
    pub const fn items(&self) -> &ItemLedger {
        &self.items
    }

    /// Mutable structure inventories.
    pub fn items_mut(&mut self) -> &mut ItemLedger {
        &mut self.items
    }

    /// Number of delayed effects still pending.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.scheduled.len()
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Paint a registered floor over an inclusive tile rectangle.
    pub fn paint_floor(&mut self, floor: &FloorId, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<()> {
        let floor = self.content.floor(floor)?.clone();
        let index = self.grid.add_floor(floor);
        self.grid.fill_floor(x0, y0, x1, y1, index);
        Ok(())
    }

    /// Spawn a unit of a registered type.
    pub fn spawn_unit(&mut self, kind: &UnitTypeId, team: Team, position: Vec2) -> Result<EntityId> {
        let kind = self.content.unit_type(kind)?.clone();
        Ok(self.spawn_unit_of(kind, team, position))
    }

    /// Spawn a unit from an explicit type definition.
    pub fn spawn_unit_of(&mut self, kind: UnitType, team: Team, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        self.units.insert(id, Unit::new(id, kind, team, position));
        id
    }

    /// Place a generator of a registered type anchored at `tile`.
    pub fn place_generator(
        &mut self,
        kind: &GeneratorTypeId,
        team: Team,
        tile: (i32, i32),
    ) -> Result<EntityId> {
        let kind = self.content.generator(kind)?.clone();
        if !self.grid.can_occupy(tile.0, tile.1, kind.size) {
            return Err(SimError::InvalidState(format!(
                "cannot place '{}' at {tile:?}: footprint blocked",
                kind.id
            )));
        }

        let id = self.allocate_id();
        self.grid.occupy(tile.0, tile.1, kind.size, id);
        let center = self.grid.structure_center(tile.0, tile.1, kind.size);
        self.generators
            .insert(id, GeneratorBlock::new(id, kind, team, tile, center));
        Ok(id)
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Look up a generator.
    #[must_use]
    pub fn generator(&self, id: EntityId) -> Option<&GeneratorBlock> {
        self.generators.get(&id)
    }

    /// Look up a generator mutably.
    pub fn generator_mut(&mut self, id: EntityId) -> Option<&mut GeneratorBlock> {
        self.generators.get_mut(&id)
    }

    /// Units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Generators in id order.
    pub fn generators(&self) -> impl Iterator<Item = &GeneratorBlock> {
        self.generators.values()
    }

    /// Damage a structure. It is destroyed on the next tick if this kills it.
    pub fn damage_structure(&mut self, id: EntityId, amount: f32) -> Result<bool> {
        let generator = self
            .generators
            .get_mut(&id)
            .ok_or(SimError::EntityNotFound(id))?;
        Ok(generator.structure.body.damage(amount))
    }

    /// Destroy a structure immediately, resolving any explosion it causes.
    pub fn destroy_structure(&mut self, id: EntityId) -> Result<TickEvents> {
        if !self.generators.contains_key(&id) {
            return Err(SimError::EntityNotFound(id));
        }
        let mut events = TickEvents::default();
        self.detonate(id, &mut events);
        self.resolve_area_damage(&mut events);
        events.deaths = self.remove_dead_units();
        Ok(events)
    }

    /// Advance the simulation by one tick.
    ///
    /// Runs all systems in deterministic order and increments the tick counter.
    /// Returns events generated during this tick for use by the outer layers.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let delta = self.config.delta;

        // 1. Units
        {
            let mut sink = TickSink {
                events: &mut events,
                scheduled: &mut self.scheduled,
            };
            let mut ctx = UnitContext {
                delta,
                terrain: &self.grid,
                collider: &self.grid,
                statuses: self.content.statuses(),
                timers: &mut self.timers,
                effects: &mut sink,
            };
            for unit in self.units.values_mut() {
                unit.update(&mut ctx);
            }
        }

        // 2. Generators
        {
            let mut ctx = GeneratorContext {
                delta,
                consumption: &mut self.items,
                timers: &mut self.timers,
            };
            for generator in self.generators.values_mut() {
                events.power_produced += generator.update(&mut ctx);
            }
        }

        // 3. Destruction
        let doomed: Vec<EntityId> = self
            .generators
            .values()
            .filter(|g| g.is_destroyed())
            .map(GeneratorBlock::id)
            .collect();
        for id in doomed {
            self.detonate(id, &mut events);
        }

        // 4. Area damage
        self.resolve_area_damage(&mut events);

        // 5. Cleanup
        events.deaths = self.remove_dead_units();

        // 6. Delayed effects
        events.deferred = self.scheduled.advance(delta);

        self.tick += 1;

        #[cfg(feature = "debug-validation")]
        self.validate();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Run a generator's destruction hook and remove it.
    fn detonate(&mut self, id: EntityId, events: &mut TickEvents) {
        let Some(mut generator) = self.generators.remove(&id) else {
            return;
        };

        let mut sink = TickSink {
            events: &mut *events,
            scheduled: &mut self.scheduled,
        };
        let detonation = generator.on_destroyed(&mut DestroyContext {
            tile_size: self.config.tile_size,
            occupancy: &mut self.grid,
            effects: &mut sink,
            rng: &mut self.rng,
        });

        self.items.clear_structure(id);
        self.timers.forget(id);
        events.dropped_effects += detonation.dropped;
        events.destroyed.push(id);
    }

    /// Apply every queued blast. Structures a blast destroys detonate in
    /// turn, appending their own blasts to the queue.
    fn resolve_area_damage(&mut self, events: &mut TickEvents) {
        let mut cursor = 0;
        while cursor < events.area_damage.len() {
            let blast = events.area_damage[cursor];
            cursor += 1;

            for unit in self.units.values_mut() {
                if let Some(amount) = blast.damage_at(unit.position()) {
                    unit.damage(amount);
                }
            }

            let mut destroyed = Vec::new();
            for generator in self.generators.values_mut() {
                if let Some(amount) = blast.damage_at(generator.position()) {
                    if generator.structure.body.damage(amount) {
                        destroyed.push(generator.id());
                    }
                }
            }
            for id in destroyed {
                self.detonate(id, events);
            }
        }
    }

    fn remove_dead_units(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .units
            .values()
            .filter(|u| u.is_dead())
            .map(Unit::id)
            .collect();
        for id in &dead {
            self.units.remove(id);
            self.timers.forget(*id);
        }
        dead
    }

    /// Panic if any clamped quantity left its range.
    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        for unit in self.units.values() {
            assert!(
                (0.0..=1.0).contains(&unit.drown_time),
                "unit {} drown progress {} out of range",
                unit.id(),
                unit.drown_time
            );
            assert!(
                unit.status.iter().all(|(_, active)| active.remaining > 0.0),
                "unit {} holds an expired status",
                unit.id()
            );
        }
        for generator in self.generators.values() {
            assert!(
                (0.0..=1.0).contains(&generator.warmup),
                "generator {} warmup {} out of range",
                generator.id(),
                generator.warmup
            );
        }
    }

    /// Write every generator's persisted state, in id order.
    ///
    /// Each record is the entity id followed by the generator's fields.
    pub fn save_structures(&self) -> Result<Vec<u8>> {
        let mut writer = SaveWriter::new();
        writer.write(&(self.generators.len() as u64))?;
        for (id, generator) in &self.generators {
            writer.write(id)?;
            generator.write_state(&mut writer)?;
        }
        Ok(writer.into_bytes())
    }

    /// Restore generator state written by [`save_structures`](Self::save_structures)
    /// onto the same layout of placed generators.
    ///
    /// Records are decoded into copies and committed only once the whole
    /// stream has parsed, so a failed load leaves every generator untouched.
    /// A generator restored with no health is destroyed on the next tick.
    pub fn load_structures(&mut self, bytes: &[u8]) -> Result<()> {
        let mut reader = SaveReader::new(bytes);
        let count: u64 = reader.read()?;
        let mut staged = BTreeMap::new();
        for _ in 0..count {
            let id: EntityId = reader.read()?;
            let mut generator = self
                .generators
                .get(&id)
                .ok_or(SimError::EntityNotFound(id))?
                .clone();
            generator.read_state(&mut reader)?;
            staged.insert(id, generator);
        }
        if reader.remaining() > 0 {
            return Err(SimError::Persistence(format!(
                "{} trailing bytes after structure records",
                reader.remaining()
            )));
        }
        tracing::debug!(structures = staged.len(), "Structures loaded");
        self.generators.extend(staged);
        Ok(())
    }

    /// Compute a deterministic hash of the simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for (id, unit) in &self.units {
            id.hash(&mut hasher);
            unit.body.position.x.to_bits().hash(&mut hasher);
            unit.body.position.y.to_bits().hash(&mut hasher);
            unit.velocity.x.to_bits().hash(&mut hasher);
            unit.velocity.y.to_bits().hash(&mut hasher);
            unit.body.health.to_bits().hash(&mut hasher);
            unit.drown_time.to_bits().hash(&mut hasher);
            for (status, active) in unit.status.iter() {
                status.hash(&mut hasher);
                active.remaining.to_bits().hash(&mut hasher);
            }
        }

        self.generators.len().hash(&mut hasher);
        for (id, generator) in &self.generators {
            id.hash(&mut hasher);
            generator.warmup.to_bits().hash(&mut hasher);
            generator.structure.body.health.to_bits().hash(&mut hasher);
        }

        self.items.hash(&mut hasher);
        self.scheduled.len().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the full simulation state for snapshots or replay.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SimError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SimError::InvalidState(format!("Failed to deserialize simulation: {e}")))
    }
}
