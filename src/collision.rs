//! Walkability predicates shared by pathfinding, wandering and movement.
//!
//! Planning a path and taking a step must agree on what is passable, so all
//! of them go through these methods.

use crate::components::Solid;
use crate::world::{EntityId, SimulationWorld};

impl SimulationWorld {
    /// Inside the map and not a wall tile. Ignores entities.
    pub fn is_walkable(&self, col: i32, row: i32) -> bool {
        match self.map().get(col, row) {
            Some(tile) => !tile.solid,
            None => false,
        }
    }

    /// Any entity on the cell carries `Solid`.
    pub fn is_solid_at(&self, col: i32, row: i32) -> bool {
        self.entities_at(col, row).into_iter().any(|e| self.has::<Solid>(e))
    }

    /// Like `is_solid_at`, ignoring `except` (usually the mover itself).
    pub fn is_solid_at_except(&self, col: i32, row: i32, except: EntityId) -> bool {
        self.entities_at(col, row)
            .into_iter()
            .any(|e| e != except && self.has::<Solid>(e))
    }

    pub fn is_free(&self, col: i32, row: i32) -> bool {
        self.is_walkable(col, row) && !self.is_solid_at(col, row)
    }

    /// First solid entity on the cell other than `except`.
    pub fn solid_at(&self, col: i32, row: i32, except: Option<EntityId>) -> Option<EntityId> {
        self.entities_at(col, row)
            .into_iter()
            .find(|e| Some(*e) != except && self.has::<Solid>(*e))
    }
}

#[cfg(test)]
mod tests {
    use crate::components::{Loc, Solid};
    use crate::tilemap::TileMap;
    use crate::world::SimulationWorld;

    fn world() -> SimulationWorld {
        let mut world = SimulationWorld::new();
        world.set_map(TileMap::from_ascii(&["...", ".#.", "..."]));
        world
    }

    #[test]
    fn test_walls_and_bounds() {
        let world = world();
        assert!(world.is_walkable(0, 0));
        assert!(!world.is_walkable(1, 1));
        assert!(!world.is_walkable(-1, 0));
        assert!(!world.is_walkable(3, 0));
    }

    #[test]
    fn test_solid_entities_block_free() {
        let mut world = world();
        let rock = world.create_entity((Loc::new(2, 0), Solid));
        world.create_entity(Loc::new(0, 2));

        assert!(world.is_walkable(2, 0));
        assert!(world.is_solid_at(2, 0));
        assert!(!world.is_free(2, 0));
        assert!(!world.is_solid_at_except(2, 0, rock));
        assert_eq!(world.solid_at(2, 0, None), Some(rock));

        assert!(!world.is_solid_at(0, 2));
        assert!(world.is_free(0, 2));
    }

    #[test]
    fn test_free_agrees_with_components() {
        let mut world = world();
        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..20 {
            let e = world.create_entity(Loc::new(rng.i32(0..3), rng.i32(0..3)));
            if rng.bool() {
                world.add(e, Solid);
            }
        }
        let located = world.bucket::<Loc>();
        for col in -1..4 {
            for row in -1..4 {
                let solid_here = located
                    .iter()
                    .any(|(e, l)| l.col == col && l.row == row && world.has::<Solid>(*e));
                assert_eq!(world.is_free(col, row), world.is_walkable(col, row) && !solid_here);
            }
        }
    }
}
