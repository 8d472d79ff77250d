//! AI brain for grid creatures.
//!
//! Runs on its own cadence (`SimConfig::ai_interval`) rather than every
//! tick. Each pass gathers a `Perception`, lets `choose_mode` pick a
//! behaviour and, when the plan is stale, installs a fresh `PathFollower`:
//! - chase, flee and loot routes come from A*;
//! - patrols compile the entity's path code from a fixed origin;
//! - wandering takes one random free step.

use bevy_ecs::query::With;
use log::{debug, error};

use crate::astar::{pathfind, GridPos};
use crate::components::*;
use crate::decision::{choose_mode, dir_to, has_line_of_sight, is_adjacent, is_facing, Perception};
use crate::error::PathError;
use crate::path::{parse_code, PathStep};
use crate::systems::combat::bump_attack;
use crate::world::{EntityId, SimulationWorld};

const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// How many flee destinations are tried before giving up.
const FLEE_CANDIDATES: usize = 8;

// ============================================================================
// AI SYSTEM
// ============================================================================

/// Think for every AI entity once enough time has banked up.
///
/// ## Data Access
/// - Reads: Loc, Direction, OnFire, Pickup, the player
/// - Writes: Ai, PathFollower, target Health (attacks)
pub fn ai_system(world: &mut SimulationWorld, dt: f32) {
    let interval = world.config().ai_interval;
    world.ai_clock += dt;
    if world.ai_clock < interval {
        return;
    }
    // One pass per tick; drop any backlog beyond the next interval.
    world.ai_clock = (world.ai_clock - interval).min(interval);

    for id in world.query::<(With<Ai>, With<Loc>)>() {
        think(world, id);
    }
}

/// Everything one think pass needs about an entity's surroundings.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub perception: Perception,
    pub me: Loc,
    pub target: Option<(EntityId, Loc)>,
    /// Nearest visible pickup, for looters.
    pub pickup: Option<Loc>,
}

pub fn perceive(world: &mut SimulationWorld, id: EntityId) -> Option<View> {
    let me = world.loc(id)?;
    let ai = world.get::<Ai>(id)?.clone();
    let facing = world.get::<Direction>(id).copied().unwrap_or_default();

    let pickups: Vec<Loc> = if ai.loots {
        world
            .query::<(With<Pickup>, With<Loc>)>()
            .into_iter()
            .filter_map(|e| world.loc(e))
            .collect()
    } else {
        Vec::new()
    };

    let range = world.config().sight_range;
    let los_mode = world.config().los_mode;
    let view: &SimulationWorld = world;
    let blocks = |col: i32, row: i32| !view.is_walkable(col, row) || view.is_solid_at(col, row);
    let sees = |to: Loc| has_line_of_sight(me, to, range, los_mode, blocks);

    let target = view
        .player()
        .filter(|p| *p != id)
        .and_then(|p| view.loc(p).map(|at| (p, at)));
    let pickup = pickups
        .into_iter()
        .filter(|at| sees(*at))
        .min_by_key(|at| me.manhattan(at));

    let perception = Perception {
        on_fire: view.has::<OnFire>(id),
        adjacent_to_target: target.is_some_and(|(_, at)| is_adjacent(me, at)),
        facing_target: target.is_some_and(|(_, at)| is_facing(facing, me, at)),
        sees_target: target.is_some_and(|(_, at)| sees(at)),
        has_patrol: ai.patrol.is_some(),
        loots: ai.loots,
        sees_pickup: pickup.is_some(),
    };

    Some(View {
        perception,
        me,
        target,
        pickup,
    })
}

/// One decision pass for `id`.
pub fn think(world: &mut SimulationWorld, id: EntityId) {
    let Some(view) = perceive(world, id) else {
        return;
    };
    let Some(ai) = world.get::<Ai>(id).cloned() else {
        return;
    };
    let previous = ai.mode;
    let mut mode = choose_mode(&view.perception);

    if mode == AiMode::Attack {
        set_mode(world, id, mode, None);
        world.remove_component::<PathFollower>(id);
        if let Some((target, _)) = view.target {
            bump_attack(world, id, target);
        }
        log_change(id, previous, mode);
        return;
    }

    let goal = match mode {
        AiMode::Chase => view.target.map(|(_, at)| at),
        AiMode::Loot => view.pickup,
        _ => None,
    };
    // A patrol that ran to its end stays put; other finished plans, including
    // the walk back to a patrol origin, are redone.
    let needs_plan = match world.get::<PathFollower>(id) {
        None => true,
        Some(f) => f.stalled || (f.finished && (mode != AiMode::Patrol || ai.returning)),
    };
    let stale_goal = goal.is_some() && goal != ai.chase_goal;
    if mode == previous && !needs_plan && !stale_goal {
        return;
    }
    // A blocked patrol keeps its route and tries the same step again.
    if mode == AiMode::Patrol && previous == AiMode::Patrol && !ai.returning {
        if let Some(mut f) = world.get_mut::<PathFollower>(id) {
            if f.stalled {
                f.stalled = false;
                return;
            }
        }
    }

    let plan = match mode {
        AiMode::Patrol => match plan_patrol(world, id, view.me, &ai) {
            Ok(follower) => follower,
            Err(err) => {
                error!("{id:?} has a bad patrol code {:?}: {err}", ai.patrol);
                if let Some(mut brain) = world.get_mut::<Ai>(id) {
                    brain.patrol = None;
                }
                mode = AiMode::Wander;
                plan_wander(world, id, view.me)
            }
        },
        AiMode::Chase => goal.and_then(|g| plan_chase(world, id, view.me, g)),
        AiMode::Loot => goal.and_then(|g| plan_route(world, id, view.me, g)),
        AiMode::Flee => plan_flee(world, id, view.me, view.target.map(|(_, at)| at)),
        AiMode::Wander => plan_wander(world, id, view.me),
        AiMode::Attack => None,
    };

    log_change(id, previous, mode);
    set_mode(world, id, mode, goal);
    match plan {
        Some(follower) => world.add(id, follower),
        None => world.remove_component::<PathFollower>(id),
    }
}

fn set_mode(world: &mut SimulationWorld, id: EntityId, mode: AiMode, goal: Option<Loc>) {
    if let Some(mut ai) = world.get_mut::<Ai>(id) {
        ai.mode = mode;
        ai.chase_goal = goal;
    }
}

fn log_change(id: EntityId, previous: AiMode, mode: AiMode) {
    if previous != mode {
        debug!("{id:?} switched {previous:?} -> {mode:?}");
    }
}

// ============================================================================
// PLANNING
// ============================================================================

fn grid(loc: Loc) -> GridPos {
    GridPos::new(loc.col, loc.row)
}

/// Movement steps along `cells`, each facing the way it was entered.
fn steps_along(start: Loc, cells: &[GridPos]) -> Vec<PathStep> {
    let mut prev = grid(start);
    cells
        .iter()
        .map(|cell| {
            let dir = Facing::from_delta(cell.col - prev.col, cell.row - prev.row);
            prev = *cell;
            PathStep::new(cell.col, cell.row, dir)
        })
        .collect()
}

fn follower(world: &SimulationWorld, steps: Vec<PathStep>, mode: PathMode) -> PathFollower {
    PathFollower::new(steps, mode, world.config().path_step_interval)
}

fn passable_for(world: &SimulationWorld, id: EntityId, col: i32, row: i32) -> bool {
    world.is_walkable(col, row) && !world.is_solid_at_except(col, row, id)
}

/// Compile the patrol route from its origin.
///
/// An entity that has been pulled off its origin first gets a one-shot walk
/// back there; the route itself is planned once it arrives. `Ok(None)` when
/// the origin cannot be reached right now.
fn plan_patrol(world: &mut SimulationWorld, id: EntityId, me: Loc, ai: &Ai) -> Result<Option<PathFollower>, PathError> {
    let code = ai.patrol.as_deref().unwrap_or_default();
    let (origin, facing) = match ai.patrol_origin {
        Some(origin) => origin,
        None => {
            let facing = world
                .get::<Direction>(id)
                .and_then(|d| d.facing())
                .unwrap_or(Facing::D);
            (me, facing)
        }
    };
    let route = parse_code(code, origin.col, origin.row, facing)?;
    let returning = origin != me;
    if let Some(mut brain) = world.get_mut::<Ai>(id) {
        brain.patrol_origin = Some((origin, facing));
        brain.returning = returning;
    }

    if returning {
        return Ok(plan_route(world, id, me, origin));
    }
    Ok(Some(follower(world, route, ai.patrol_mode)))
}

/// Walk up next to `goal` and turn to face it.
fn plan_chase(world: &SimulationWorld, id: EntityId, me: Loc, goal: Loc) -> Option<PathFollower> {
    let map = world.map();
    let cells = pathfind(
        grid(me),
        grid(goal),
        |c, r| (c, r) == (goal.col, goal.row) || passable_for(world, id, c, r),
        map.width,
        map.height,
    )?;
    // Drop our own cell and the goal's.
    let approach = &cells[1..cells.len().saturating_sub(1).max(1)];
    let mut steps = steps_along(me, approach);
    let last = approach.last().map_or(me, |c| Loc::new(c.col, c.row));
    steps.push(PathStep::new(last.col, last.row, dir_to(last, goal).facing()));
    Some(follower(world, steps, PathMode::Once))
}

/// Walk onto `goal`.
fn plan_route(world: &SimulationWorld, id: EntityId, me: Loc, goal: Loc) -> Option<PathFollower> {
    let map = world.map();
    let cells = pathfind(grid(me), grid(goal), |c, r| passable_for(world, id, c, r), map.width, map.height)?;
    let steps = steps_along(me, &cells[1..]);
    Some(follower(world, steps, PathMode::Once))
}

/// Run for the reachable cell within `flee_radius` that is furthest from
/// `threat` (from our own cell when there is no threat).
fn plan_flee(world: &SimulationWorld, id: EntityId, me: Loc, threat: Option<Loc>) -> Option<PathFollower> {
    let threat = threat.unwrap_or(me);
    let radius = world.config().flee_radius;
    let mut candidates = Vec::new();
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let cell = me.offset(dc, dr);
            if cell != me && me.manhattan(&cell) <= radius && passable_for(world, id, cell.col, cell.row) {
                candidates.push(cell);
            }
        }
    }
    candidates.sort_by_key(|c| (-c.manhattan(&threat), me.manhattan(c), c.row, c.col));

    candidates
        .into_iter()
        .take(FLEE_CANDIDATES)
        .find_map(|cell| plan_route(world, id, me, cell))
}

/// One random free step, if there is one.
fn plan_wander(world: &mut SimulationWorld, id: EntityId, me: Loc) -> Option<PathFollower> {
    let open: Vec<Loc> = NEIGHBORS
        .iter()
        .map(|&(dx, dy)| me.offset(dx, dy))
        .filter(|cell| passable_for(world, id, cell.col, cell.row))
        .collect();
    if open.is_empty() {
        return None;
    }
    let pick = open[world.rng().usize(0..open.len())];
    let steps = steps_along(me, &[grid(pick)]);
    Some(follower(world, steps, PathMode::Once))
}
