//! Single-cell moves for the player and scripted movers.
//!
//! A move resolves, in order: walls, bump attacks on hostiles, pushing,
//! collision callbacks on other solids, and finally the step itself
//! (optionally pulling whatever is behind) followed by portal entry.

use log::trace;

use crate::components::*;
use crate::host::Input;
use crate::systems::combat::{are_hostile, bump_attack};
use crate::systems::portal::enter_portal;
use crate::systems::pushable::{try_pulling, try_pushing};
use crate::world::{EntityId, SimulationWorld};

/// What happened when an entity tried to step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Stepped and landed somewhere else through a portal.
    Teleported(Loc),
    /// Pushed the given entity and stepped into its old cell.
    Pushed(EntityId),
    /// Hit a hostile instead of moving.
    Attacked(EntityId),
    /// Walked into a solid entity; its type handler was notified.
    Collided(EntityId),
    Blocked,
}

/// Arrow key names, paired with the direction they move in.
pub const ARROW_KEYS: [(&str, Direction); 4] = [
    ("up", Direction { dx: 0, dy: -1 }),
    ("down", Direction { dx: 0, dy: 1 }),
    ("left", Direction { dx: -1, dy: 0 }),
    ("right", Direction { dx: 1, dy: 0 }),
];

/// Try to move `mover` one cell along `dir`.
///
/// The mover turns to face `dir` even when the move fails.
pub fn try_move(world: &mut SimulationWorld, mover: EntityId, dir: Direction, pull: bool) -> MoveOutcome {
    let Some(from) = world.loc(mover) else {
        return MoveOutcome::Blocked;
    };
    if dir.is_zero() {
        return MoveOutcome::Blocked;
    }
    if let Some(mut facing) = world.get_mut::<Direction>(mover) {
        *facing = dir;
    }

    let to = from.offset(dir.dx, dir.dy);
    if !world.is_walkable(to.col, to.row) {
        return MoveOutcome::Blocked;
    }

    let hostile = {
        let view: &SimulationWorld = world;
        view.entities_at(to.col, to.row)
            .into_iter()
            .find(|e| view.has::<AttackTarget>(*e) && view.has::<Health>(*e) && are_hostile(view, mover, *e))
    };
    if let Some(target) = hostile {
        bump_attack(world, mover, target);
        return MoveOutcome::Attacked(target);
    }

    let mut pushed = None;
    if let Some(blocker) = world.solid_at(to.col, to.row, Some(mover)) {
        pushed = try_pushing(world, from, dir);
        if pushed.is_none() {
            world.types().on_collision(world, blocker, mover);
            return MoveOutcome::Collided(blocker);
        }
        // The crate may have shared its cell with another solid.
        if let Some(other) = world.solid_at(to.col, to.row, Some(mover)) {
            world.types().on_collision(world, other, mover);
            return MoveOutcome::Collided(other);
        }
    }

    world.set_loc(mover, to.col, to.row);
    trace!("{mover:?} stepped to ({}, {})", to.col, to.row);
    if pull && pushed.is_none() {
        try_pulling(world, from, dir);
    }

    if let Some(landing) = enter_portal(world, mover) {
        return MoveOutcome::Teleported(landing);
    }
    match pushed {
        Some(id) => MoveOutcome::Pushed(id),
        None => MoveOutcome::Moved,
    }
}

/// Move the player from this frame's input.
///
/// Arrows are edge-triggered; holding `pull` drags the object behind.
pub fn drive_player(world: &mut SimulationWorld, input: &dyn Input) -> Option<MoveOutcome> {
    if world.is_game_over() {
        return None;
    }
    let player = world.player()?;
    let (_, dir) = ARROW_KEYS.into_iter().find(|(key, _)| input.key_just_pressed(key))?;
    Some(try_move(world, player, dir, input.key_held("pull")))
}
