//! Pushing and pulling solid, pushable objects.

use log::debug;

use crate::components::*;
use crate::world::{EntityId, SimulationWorld};

/// First entity on the cell that is both `Solid` and `Pushable`.
pub fn pushable_at(world: &SimulationWorld, col: i32, row: i32) -> Option<EntityId> {
    world
        .entities_at(col, row)
        .into_iter()
        .find(|e| world.has::<Solid>(*e) && world.has::<Pushable>(*e))
}

/// A mover at `from` pushes along `dir`.
///
/// The object in the cell ahead slides one cell further when that cell is
/// walkable and holds no solid entity. Returns the pushed entity. The mover
/// itself is not moved.
pub fn try_pushing(world: &mut SimulationWorld, from: Loc, dir: Direction) -> Option<EntityId> {
    if dir.is_zero() {
        return None;
    }
    let ahead = from.offset(dir.dx, dir.dy);
    let pushed = pushable_at(world, ahead.col, ahead.row)?;
    let beyond = ahead.offset(dir.dx, dir.dy);
    if !world.is_free(beyond.col, beyond.row) {
        return None;
    }
    world.set_loc(pushed, beyond.col, beyond.row);
    world.sfx("push");
    debug!("pushed {pushed:?} to ({}, {})", beyond.col, beyond.row);
    Some(pushed)
}

/// A mover that just left `from` along `dir` drags the object behind it.
///
/// The object in the trailing cell (`from - dir`) moves into `from` when
/// `from` is walkable and no solid entity is left there. Call this after
/// the mover has stepped away. Returns the pulled entity.
pub fn try_pulling(world: &mut SimulationWorld, from: Loc, dir: Direction) -> Option<EntityId> {
    if dir.is_zero() {
        return None;
    }
    let behind = from.offset(-dir.dx, -dir.dy);
    let pulled = pushable_at(world, behind.col, behind.row)?;
    if !world.is_free(from.col, from.row) {
        return None;
    }
    world.set_loc(pulled, from.col, from.row);
    debug!("pulled {pulled:?} to ({}, {})", from.col, from.row);
    Some(pulled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::TileMap;

    fn world(rows: &[&str]) -> SimulationWorld {
        let mut world = SimulationWorld::new();
        world.set_map(TileMap::from_ascii(rows));
        world
    }

    #[test]
    fn test_push_into_open_cell() {
        let mut world = world(&["....."]);
        let crate_id = world.create_entity((Loc::new(2, 0), Solid, Pushable));
        let pushed = try_pushing(&mut world, Loc::new(1, 0), Direction::new(1, 0));
        assert_eq!(pushed, Some(crate_id));
        assert_eq!(world.loc(crate_id), Some(Loc::new(3, 0)));
    }

    #[test]
    fn test_push_blocked_by_wall_or_solid() {
        let mut world = world(&["...#."]);
        let crate_id = world.create_entity((Loc::new(2, 0), Solid, Pushable));
        assert_eq!(try_pushing(&mut world, Loc::new(1, 0), Direction::new(1, 0)), None);
        assert_eq!(world.loc(crate_id), Some(Loc::new(2, 0)));

        let mut world = self::world(&["....."]);
        let a = world.create_entity((Loc::new(2, 0), Solid, Pushable));
        world.create_entity((Loc::new(3, 0), Solid, Pushable));
        assert_eq!(try_pushing(&mut world, Loc::new(1, 0), Direction::new(1, 0)), None);
        assert_eq!(world.loc(a), Some(Loc::new(2, 0)));
    }

    #[test]
    fn test_non_pushable_solid_is_not_pushed() {
        let mut world = world(&["....."]);
        world.create_entity((Loc::new(2, 0), Solid));
        assert_eq!(try_pushing(&mut world, Loc::new(1, 0), Direction::new(1, 0)), None);
    }

    #[test]
    fn test_pull_follows_mover() {
        let mut world = world(&["....."]);
        let crate_id = world.create_entity((Loc::new(1, 0), Solid, Pushable));
        let mover = world.create_entity((Loc::new(2, 0), Solid));

        world.set_loc(mover, 3, 0);
        let pulled = try_pulling(&mut world, Loc::new(2, 0), Direction::new(1, 0));

        assert_eq!(pulled, Some(crate_id));
        assert_eq!(world.loc(crate_id), Some(Loc::new(2, 0)));
    }

    #[test]
    fn test_pull_fails_while_mover_still_there() {
        let mut world = world(&["....."]);
        world.create_entity((Loc::new(1, 0), Solid, Pushable));
        world.create_entity((Loc::new(2, 0), Solid));
        assert_eq!(try_pulling(&mut world, Loc::new(2, 0), Direction::new(1, 0)), None);
    }
}
