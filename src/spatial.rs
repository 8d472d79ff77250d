//! Spatial index for "what is standing on this cell" lookups.
//!
//! Provides O(1) cell lookup, and O(k) removal where k is the number of
//! entities sharing the old cell.

use bevy_ecs::entity::Entity;
use std::collections::HashMap;

/// Sparse cell map from grid coordinates to the entities standing there.
///
/// Each entity is recorded in at most one cell. The reverse map lets a
/// relocation find the old cell without the caller supplying it.
#[derive(Debug, Default, Clone)]
pub struct SpatialGrid {
    /// Map from cell coordinates to entities in that cell, in arrival order.
    cells: HashMap<(i32, i32), Vec<Entity>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, (i32, i32)>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Put an entity on a cell, removing it from wherever it was before.
    pub fn place(&mut self, entity: Entity, col: i32, row: i32) {
        let cell = (col, row);
        if self.entity_cells.get(&entity) == Some(&cell) {
            return;
        }
        self.remove(entity);
        self.cells.entry(cell).or_default().push(entity);
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the grid. No-op if it is not present.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| *e != entity);
                if entries.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Copy of the entities on a cell; empty when nothing is there.
    pub fn entities_at(&self, col: i32, row: i32) -> Vec<Entity> {
        self.cells.get(&(col, row)).cloned().unwrap_or_default()
    }

    /// Cell currently holding the entity.
    pub fn cell_of(&self, entity: Entity) -> Option<(i32, i32)> {
        self.entity_cells.get(&entity).copied()
    }

    pub fn cell_count(&self, col: i32, row: i32) -> usize {
        self.cells.get(&(col, row)).map(|v| v.len()).unwrap_or(0)
    }

    /// Number of entities tracked by the grid.
    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }

    /// Every occupied cell (for debugging and invariant checks).
    pub fn all_cells(&self) -> impl Iterator<Item = (&(i32, i32), &Vec<Entity>)> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_lookup() {
        let mut grid = SpatialGrid::new();
        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);

        grid.place(e1, 3, 4);
        grid.place(e2, 3, 4);

        assert_eq!(grid.entities_at(3, 4), vec![e1, e2]);
        assert_eq!(grid.cell_of(e1), Some((3, 4)));
        assert!(grid.entities_at(0, 0).is_empty());
    }

    #[test]
    fn test_place_moves_between_cells() {
        let mut grid = SpatialGrid::new();
        let e1 = Entity::from_raw(1);

        grid.place(e1, 0, 0);
        grid.place(e1, 1, 0);

        assert!(grid.entities_at(0, 0).is_empty());
        assert_eq!(grid.entities_at(1, 0), vec![e1]);
        assert_eq!(grid.total_count(), 1);
    }

    #[test]
    fn test_place_same_cell_does_not_duplicate() {
        let mut grid = SpatialGrid::new();
        let e1 = Entity::from_raw(1);

        grid.place(e1, 2, 2);
        grid.place(e1, 2, 2);

        assert_eq!(grid.cell_count(2, 2), 1);
    }

    #[test]
    fn test_remove() {
        let mut grid = SpatialGrid::new();
        let e1 = Entity::from_raw(1);

        grid.place(e1, 5, 5);
        grid.remove(e1);
        grid.remove(e1);

        assert!(grid.entities_at(5, 5).is_empty());
        assert_eq!(grid.total_count(), 0);
        assert_eq!(grid.all_cells().count(), 0);
    }
}
