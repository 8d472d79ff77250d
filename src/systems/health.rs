//! Defeat handling and short-lived effects.

use bevy_ecs::query::With;
use log::{debug, info};

use crate::components::*;
use crate::events::SimEvent;
use crate::world::{EntityId, SimulationWorld};

/// Tick hit cooldowns and resolve anything at zero health.
///
/// Defeated entities leave a puff effect and are removed. The player is
/// never removed: it triggers game over instead, once.
pub fn health_system(world: &mut SimulationWorld, dt: f32) {
    for id in world.query::<With<Health>>() {
        let alive = match world.get_mut::<Health>(id) {
            Some(mut health) => {
                if health.cooldown_timer > 0.0 {
                    health.cooldown_timer = (health.cooldown_timer - dt).max(0.0);
                }
                health.is_alive()
            }
            None => continue,
        };
        if alive {
            continue;
        }

        if world.player() == Some(id) || world.has::<Player>(id) {
            if !world.game_over {
                world.game_over = true;
                world.emit(SimEvent::GameOver);
                info!("player {id:?} defeated, game over");
            }
            continue;
        }

        let at = world.loc(id);
        if let Some(at) = at {
            spawn_effect(world, at, '*' as u32);
        }
        world.emit(SimEvent::Defeated { entity: id, at });
        world.sfx("defeat");
        world.remove_entity(id);
        debug!("{id:?} defeated");
    }
}

/// Spawn a transient glyph that `effect_system` cleans up.
pub fn spawn_effect(world: &mut SimulationWorld, at: Loc, tile: u32) -> EntityId {
    let timer = world.config().effect_duration;
    world.create_entity((at, Effect { timer }, Sprite::new(tile, 15, 0).with_depth(20)))
}

pub fn effect_system(world: &mut SimulationWorld, dt: f32) {
    for (id, effect) in world.bucket::<Effect>() {
        let timer = effect.timer - dt;
        if timer <= 0.0 {
            world.remove_entity(id);
        } else if let Some(mut e) = world.get_mut::<Effect>(id) {
            e.timer = timer;
        }
    }
}
