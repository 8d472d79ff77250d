//! Public API for the simulation.
//!
//! `Simulation` is what a host drives: load a level, feed input, step time,
//! then draw and play whatever the tick produced.
//!
//! ## Fixed Timestep
//!
//! `step(dt)` runs exactly one tick of the registered systems. Hosts with a
//! variable frame rate call `advance(frame_dt)` instead, which accumulates
//! frame time and runs as many `SimConfig::fixed_timestep` ticks as fit,
//! capped at `max_steps_per_frame` so a long stall cannot snowball.

use log::{debug, info};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::SimEvent;
use crate::host::{dispatch_audio, render_world, Audio, Input, Persistence, Renderer};
use crate::inventory::Inventory;
use crate::systems::movement::{drive_player, MoveOutcome};
use crate::systems::register_default_systems;
use crate::systems::serialization::Snapshot;
use crate::tilemap::TileMap;
use crate::types::{EntityKind, SpawnArgs};
use crate::world::{EntityId, SimulationWorld};

/// Key the inventory is stored under by `save_progress`.
pub const PROGRESS_KEY: &str = "mapper.progress";

/// One entity placement in a level file.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelEntity {
    pub kind: EntityKind,
    pub col: i32,
    pub row: i32,
    #[serde(default)]
    pub props: Map<String, Value>,
}

/// A level: the tile rows plus what stands on them.
#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub map: Vec<Vec<Value>>,
    #[serde(default)]
    pub entities: Vec<LevelEntity>,
    /// Music pattern to start when the level loads.
    #[serde(default)]
    pub music: Option<String>,
}

/// The simulation plus its clocks.
pub struct Simulation {
    world: SimulationWorld,
    tick: u64,
    time: f32,
    /// Accumulated frame time not yet consumed by fixed ticks.
    time_accumulator: f32,
}

impl Simulation {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let mut world = SimulationWorld::with_config(config);
        register_default_systems(&mut world);
        Self {
            world,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    /// Run one tick of every registered system.
    pub fn step(&mut self, dt: f32) {
        self.world.run(dt);
        self.tick += 1;
        self.time += dt;
    }

    /// Consume `frame_dt` of wall time in fixed ticks. Returns how many
    /// ticks ran.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let fixed_dt = self.world.config().fixed_timestep;
        let max_steps = self.world.config().max_steps_per_frame;
        if fixed_dt <= 0.0 {
            return 0;
        }

        self.time_accumulator += frame_dt;
        let mut steps = 0;
        while self.time_accumulator >= fixed_dt && steps < max_steps {
            self.step(fixed_dt);
            self.time_accumulator -= fixed_dt;
            steps += 1;
        }
        if self.time_accumulator >= fixed_dt {
            debug!("dropping {:.3}s of backlog after {steps} ticks", self.time_accumulator);
            self.time_accumulator %= fixed_dt;
        }
        steps
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the world with an empty one on the map decoded from `json`.
    pub fn load_map(&mut self, json: &str) -> Result<(), SimError> {
        let map = TileMap::from_json(json)?;
        self.install_map(map);
        Ok(())
    }

    /// Load a level (`{"map": [...], "entities": [...], "music": ...}`) and
    /// return the spawned entity ids in file order. Entities whose kind has
    /// no handler are skipped.
    pub fn load_level(&mut self, json: &str) -> Result<Vec<EntityId>, SimError> {
        let level: Level = serde_json::from_str(json)?;
        let map = TileMap::from_rows(&level.map)?;
        self.install_map(map);

        let spawned: Vec<EntityId> = level
            .entities
            .into_iter()
            .filter_map(|placed| {
                let args = SpawnArgs {
                    col: placed.col,
                    row: placed.row,
                    props: placed.props,
                };
                self.spawn_with(placed.kind, &args)
            })
            .collect();

        if let Some(pattern) = level.music {
            self.world.emit(SimEvent::Music(Some(pattern)));
        }
        info!("level loaded with {} entities", spawned.len());
        Ok(spawned)
    }

    fn install_map(&mut self, map: TileMap) {
        self.world.reset();
        self.world.set_map(map);
        register_default_systems(&mut self.world);
        self.tick = 0;
        self.time = 0.0;
        self.time_accumulator = 0.0;
    }

    pub fn spawn(&mut self, kind: EntityKind, col: i32, row: i32) -> Option<EntityId> {
        self.spawn_with(kind, &SpawnArgs::at(col, row))
    }

    pub fn spawn_with(&mut self, kind: EntityKind, args: &SpawnArgs) -> Option<EntityId> {
        self.world.types().spawn(&mut self.world, kind, args)
    }

    // ------------------------------------------------------------------
    // Host boundary
    // ------------------------------------------------------------------

    /// Apply this frame's input to the player.
    pub fn handle_input(&mut self, input: &dyn Input) -> Option<MoveOutcome> {
        drive_player(&mut self.world, input)
    }

    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        render_world(&mut self.world, renderer);
    }

    /// Drain pending events, play their sounds, and hand them back for the
    /// host's other needs (dialogs, game over screens).
    pub fn flush_audio(&mut self, audio: &mut dyn Audio) -> Vec<SimEvent> {
        let events = self.world.drain_events();
        dispatch_audio(&events, audio);
        events
    }

    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    pub fn save_progress(&self, store: &mut dyn Persistence) -> Result<(), SimError> {
        let blob = self.world.inventory().to_json()?;
        store.save(PROGRESS_KEY, &blob);
        Ok(())
    }

    /// Restore the inventory saved by `save_progress`. Returns `false` when
    /// nothing was saved yet.
    pub fn load_progress(&mut self, store: &dyn Persistence) -> Result<bool, SimError> {
        let Some(blob) = store.load(PROGRESS_KEY) else {
            return Ok(false);
        };
        *self.world.inventory_mut() = Inventory::from_json(&blob)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimulationWorld {
        &mut self.world
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
