//! Stateless helpers the AI system uses to pick a behaviour.

use crate::components::{AiMode, Direction, Loc};
use crate::config::LosMode;

/// Exactly one orthogonal step apart.
pub fn is_adjacent(a: Loc, b: Loc) -> bool {
    a.manhattan(&b) == 1
}

/// Axis-aligned unit step from `from` toward `to`.
///
/// The column difference wins whenever it is non-zero, so a diagonal offset
/// always yields a horizontal step. Zero when the cells are equal.
pub fn dir_to(from: Loc, to: Loc) -> Direction {
    if to.col != from.col {
        Direction::new((to.col - from.col).signum(), 0)
    } else {
        Direction::new(0, (to.row - from.row).signum())
    }
}

/// An entity at `from` looking along `dir` is looking toward `to`.
pub fn is_facing(dir: Direction, from: Loc, to: Loc) -> bool {
    let want = dir_to(from, to);
    !want.is_zero() && dir == want
}

/// `to` lies directly behind an entity at `from` looking along `dir`.
pub fn is_behind(dir: Direction, from: Loc, to: Loc) -> bool {
    let want = dir_to(from, to);
    !want.is_zero() && !dir.is_zero() && dir.reversed() == want
}

/// Whether `from` can see `to`.
///
/// Sight fails beyond `range` (Manhattan) and always succeeds at distance
/// one or less. In between, `Traced` walks the Bresenham line and fails on
/// the first intermediate cell for which `blocks` is true; `RangeOnly`
/// skips the trace.
pub fn has_line_of_sight<F>(from: Loc, to: Loc, range: i32, mode: LosMode, blocks: F) -> bool
where
    F: Fn(i32, i32) -> bool,
{
    let distance = from.manhattan(&to);
    if distance > range {
        return false;
    }
    if distance <= 1 {
        return true;
    }
    match mode {
        LosMode::RangeOnly => true,
        LosMode::Traced => cells_between(from, to).into_iter().all(|(col, row)| !blocks(col, row)),
    }
}

/// Cells on the Bresenham line from `from` to `to`, endpoints excluded.
pub fn cells_between(from: Loc, to: Loc) -> Vec<(i32, i32)> {
    let (mut x, mut y) = (from.col, from.row);
    let dx = (to.col - x).abs();
    let dy = -(to.row - y).abs();
    let sx = (to.col - x).signum();
    let sy = (to.row - y).signum();
    let mut err = dx + dy;
    let mut cells = Vec::new();

    while (x, y) != (to.col, to.row) {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if (x, y) != (to.col, to.row) {
            cells.push((x, y));
        }
    }
    cells
}

/// What an AI knows about its surroundings on one think pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perception {
    pub on_fire: bool,
    pub adjacent_to_target: bool,
    pub facing_target: bool,
    pub sees_target: bool,
    pub has_patrol: bool,
    pub loots: bool,
    pub sees_pickup: bool,
}

/// Pick a mode. Priority, highest first: flee while burning, attack an
/// adjacent target we face, chase a visible target, patrol, then idle
/// (loot a visible pickup if this entity loots, otherwise wander).
pub fn choose_mode(p: &Perception) -> AiMode {
    if p.on_fire {
        AiMode::Flee
    } else if p.adjacent_to_target && p.facing_target {
        AiMode::Attack
    } else if p.sees_target {
        AiMode::Chase
    } else if p.has_patrol {
        AiMode::Patrol
    } else if p.loots && p.sees_pickup {
        AiMode::Loot
    } else {
        AiMode::Wander
    }
}
