//! Systems for the mapper simulation.
//!
//! Systems are plain functions `fn(&mut SimulationWorld, f32)` registered on
//! the world by name and run in ascending `order`.
//!
//! ## Tick Order
//!
//! **Decide** - plan before anything moves:
//! - `ai_system` - picks modes and installs paths
//!
//! **Move**:
//! - `path_follow_system` - advances path followers
//!
//! **Environment** - fire chain, in dependency order:
//! - `fire_system` - ignites co-located things, heats neighbours
//! - `fire_small_system` - burns the things that caught fire
//! - `flammable_system` - turns hot flammables into fires
//!
//! **Resolve**:
//! - `pickup_system` - collects what was walked onto
//! - `health_system` - removes the defeated, ends the game
//! - `effect_system` - expires transient effects
//!
//! Player movement, pushing, bump attacks and portals are not scheduled:
//! they run on input through `movement::try_move`.

pub mod ai;
pub mod combat;
pub mod fire;
pub mod health;
pub mod movement;
pub mod path_follow;
pub mod pickup;
pub mod portal;
pub mod pushable;
pub mod serialization;

pub use ai::{ai_system, think};
pub use combat::{are_hostile, bump_attack};
pub use fire::{fire_small_system, fire_system, flammable_system, ignite};
pub use health::{effect_system, health_system, spawn_effect};
pub use movement::{drive_player, try_move, MoveOutcome};
pub use path_follow::path_follow_system;
pub use pickup::pickup_system;
pub use portal::enter_portal;
pub use pushable::{try_pulling, try_pushing};
pub use serialization::*;

use crate::world::SimulationWorld;

pub const AI_ORDER: i32 = 10;
pub const PATH_FOLLOW_ORDER: i32 = 20;
pub const FIRE_ORDER: i32 = 30;
pub const FIRE_SMALL_ORDER: i32 = 40;
pub const FLAMMABLE_ORDER: i32 = 50;
pub const PICKUP_ORDER: i32 = 60;
pub const HEALTH_ORDER: i32 = 70;
pub const EFFECT_ORDER: i32 = 80;

/// Install the built-in systems. Safe to call again: re-registering a name
/// replaces it in place.
pub fn register_default_systems(world: &mut SimulationWorld) {
    world.add_system("ai", ai_system, AI_ORDER);
    world.add_system("path_follow", path_follow_system, PATH_FOLLOW_ORDER);
    world.add_system("fire", fire_system, FIRE_ORDER);
    world.add_system("fire_small", fire_small_system, FIRE_SMALL_ORDER);
    world.add_system("flammable", flammable_system, FLAMMABLE_ORDER);
    world.add_system("pickup", pickup_system, PICKUP_ORDER);
    world.add_system("health", health_system, HEALTH_ORDER);
    world.add_system("effects", effect_system, EFFECT_ORDER);
}
