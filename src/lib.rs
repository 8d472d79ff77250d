//! Mapper - Simulation Core
//!
//! A deterministic grid simulation for small retro adventure games: guards
//! that patrol, chase and flee, fire that spreads between barrels, crates
//! to push around and portals to step through.
//! Uses `bevy_ecs` for entity and component storage, wrapped by
//! `SimulationWorld` so every entity position also lives in a spatial grid.

pub mod api;
pub mod astar;
pub mod collision;
pub mod components;
pub mod config;
pub mod decision;
pub mod error;
pub mod events;
pub mod host;
pub mod inventory;
pub mod path;
#[cfg(feature = "profile")]
pub mod profiler;
pub mod spatial;
pub mod systems;
pub mod tilemap;
pub mod types;
pub mod world;

pub use api::{Level, LevelEntity, Simulation};
pub use astar::{pathfind, GridPos};
pub use components::*;
pub use config::{LosMode, SimConfig};
pub use error::{MapError, PathError, SimError};
pub use events::{EventBuffer, SimEvent};
pub use host::{Audio, Input, Persistence, Renderer};
pub use inventory::Inventory;
pub use path::{parse_code, valid_path_syntax, PathStep};
pub use spatial::SpatialGrid;
pub use systems::*;
pub use tilemap::{Tile, TileMap};
pub use types::{EntityKind, EntityTypeHandler, SpawnArgs, TypeRegistry};
pub use world::{EntityId, SimulationWorld, SystemFn};
