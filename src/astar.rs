//! A* search on an implicit 4-connected grid.
//!
//! Uniform step cost 1 with a Manhattan heuristic, which is admissible and
//! consistent for 4-way movement, so the first time the goal is popped the
//! path is optimal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn manhattan(&self, other: GridPos) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// Expansion order: left, right, up, down. Changing it changes tie-break
/// path shapes.
const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

struct HeapEntry<T> {
    priority: i32,
    seq: u64,
    item: T,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    // Reversed so the std max-heap pops the smallest priority, oldest first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Binary min-heap keyed by an integer priority.
///
/// Equal priorities pop in insertion order.
pub struct MinHeap<T> {
    heap: BinaryHeap<HeapEntry<T>>,
    next_seq: u64,
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, priority: i32, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry { priority, seq, item });
    }

    /// Remove and return the lowest-priority item with its priority.
    pub fn pop(&mut self) -> Option<(i32, T)> {
        self.heap.pop().map(|e| (e.priority, e.item))
    }

    pub fn peek_priority(&self) -> Option<i32> {
        self.heap.peek().map(|e| e.priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shortest walkable path from `start` to `goal`, inclusive of both ends.
///
/// Cells outside `[0, width) x [0, height)` are never entered, and neither is
/// any cell for which `is_walkable` returns false. The start cell itself is
/// not tested. Returns `None` when the goal is unreachable.
pub fn pathfind<F>(start: GridPos, goal: GridPos, is_walkable: F, width: i32, height: i32) -> Option<Vec<GridPos>>
where
    F: Fn(i32, i32) -> bool,
{
    let mut open: MinHeap<GridPos> = MinHeap::new();
    let mut g_score: HashMap<GridPos, i32> = HashMap::new();
    let mut parent: HashMap<GridPos, GridPos> = HashMap::new();
    let mut closed: HashSet<GridPos> = HashSet::new();

    g_score.insert(start, 0);
    open.push(start.manhattan(goal), start);

    while let Some((_, current)) = open.pop() {
        if !closed.insert(current) {
            // Stale duplicate of a node already expanded with a better g.
            continue;
        }

        if current == goal {
            return Some(reconstruct(&parent, current));
        }

        let g = g_score.get(&current).copied().unwrap_or(0);
        for (dx, dy) in NEIGHBORS {
            let next = GridPos::new(current.col + dx, current.row + dy);
            if next.col < 0 || next.row < 0 || next.col >= width || next.row >= height {
                continue;
            }
            if closed.contains(&next) || !is_walkable(next.col, next.row) {
                continue;
            }
            let tentative = g + 1;
            if g_score.get(&next).map_or(true, |&known| tentative < known) {
                g_score.insert(next, tentative);
                parent.insert(next, current);
                open.push(tentative + next.manhattan(goal), next);
            }
        }
    }

    None
}

fn reconstruct(parent: &HashMap<GridPos, GridPos>, mut current: GridPos) -> Vec<GridPos> {
    let mut path = vec![current];
    while let Some(&prev) = parent.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}
