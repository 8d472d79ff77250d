//! Walks entities along their `PathFollower` steps.

use bevy_ecs::query::With;
use log::trace;

use crate::components::*;
use crate::decision::dir_to;
use crate::path::PathStep;
use crate::world::{EntityId, SimulationWorld};

/// Count each follower's timer down and take one step when it runs out.
///
/// A step onto the current cell (a pause or face step) always succeeds.
/// A move succeeds when the target cell is walkable and no other solid
/// entity stands there. The entity turns toward the step either way, but
/// the index only advances on success, so a blocked step is retried rather
/// than skipped and the entity never jumps more than one cell. A blocked
/// `Once` path stalls until the AI resumes or replaces it.
pub fn path_follow_system(world: &mut SimulationWorld, dt: f32) {
    for id in world.query::<(With<PathFollower>, With<Loc>)>() {
        let Some(from) = world.loc(id) else {
            continue;
        };
        let step = match world.get_mut::<PathFollower>(id) {
            Some(mut follower) => {
                if !follower.is_active() {
                    continue;
                }
                follower.timer -= dt;
                if follower.timer > 0.0 {
                    continue;
                }
                follower.timer = follower.interval;
                match follower.current().copied() {
                    Some(step) => step,
                    None => {
                        follower.finished = true;
                        continue;
                    }
                }
            }
            None => continue,
        };

        turn_toward(world, id, from, &step);

        let stay = step.x == from.col && step.y == from.row;
        let ok = stay || (world.is_walkable(step.x, step.y) && !world.is_solid_at_except(step.x, step.y, id));
        if ok && !stay {
            world.set_loc(id, step.x, step.y);
            trace!("{id:?} followed path to ({}, {})", step.x, step.y);
        }

        if let Some(mut follower) = world.get_mut::<PathFollower>(id) {
            if ok {
                follower.stalled = false;
                follower.advance();
            } else if follower.mode == PathMode::Once {
                follower.stalled = true;
            }
        }
    }
}

fn turn_toward(world: &mut SimulationWorld, id: EntityId, from: Loc, step: &PathStep) {
    let dir = match step.dir {
        Some(facing) => Direction::from(facing),
        None => dir_to(from, Loc::new(step.x, step.y)),
    };
    if dir.is_zero() {
        return;
    }
    if let Some(mut current) = world.get_mut::<Direction>(id) {
        *current = dir;
    }
}
