//! Tile map - the static layer under the entities.
//!
//! Each cell is stored by the map codec as a tuple
//! `[char, fg, bg, collisionFlag, extra]`. The collision flag is the only
//! part the simulation reads; the rest is passed through to rendering.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MapError;

/// A single cell of the map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Glyph index.
    pub tile: u32,
    pub fg: u8,
    pub bg: u8,
    /// Collision flag: walls are solid.
    pub solid: bool,
    /// Opaque per-cell data owned by content.
    pub extra: Value,
}

impl Tile {
    pub fn new(tile: u32, fg: u8, bg: u8, solid: bool) -> Self {
        Self {
            tile,
            fg,
            bg,
            solid,
            extra: Value::Null,
        }
    }

    /// Decode the `[char, fg, bg, collisionFlag, extra]` tuple.
    ///
    /// `char` may be a glyph index or a one-character string. Trailing
    /// elements may be omitted and default to zero/false/null.
    pub fn from_tuple(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let tile = match items.first()? {
            Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
            Value::String(s) => s.chars().next()? as u32,
            _ => return None,
        };
        let color = |i: usize| -> Option<u8> {
            match items.get(i) {
                None | Some(Value::Null) => Some(0),
                Some(v) => u8::try_from(v.as_u64()?).ok(),
            }
        };
        let solid = match items.get(3) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() != Some(0),
            Some(_) => return None,
        };
        Some(Self {
            tile,
            fg: color(1)?,
            bg: color(2)?,
            solid,
            extra: items.get(4).cloned().unwrap_or(Value::Null),
        })
    }

    pub fn to_tuple(&self) -> Value {
        Value::Array(vec![
            Value::from(self.tile),
            Value::from(self.fg),
            Value::from(self.bg),
            Value::from(self.solid),
            self.extra.clone(),
        ])
    }
}

/// Row-major grid of tiles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileMap {
    pub width: i32,
    pub height: i32,
    cells: Vec<Tile>,
}

impl TileMap {
    /// Create an open map of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Tile::default(); (width * height) as usize],
        }
    }

    /// Build a map from ASCII art: `#` is a wall, anything else is floor.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut map = Self::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    map.set(col as i32, row as i32, Tile::new(ch as u32, 7, 0, true));
                }
            }
        }
        map
    }

    /// Decode a JSON 2D array of cell tuples.
    ///
    /// Malformed cells are logged and replaced by an empty walkable tile.
    /// Rows of differing length are rejected.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;
        Self::from_rows(&rows)
    }

    /// Same as `from_json`, for rows that were already parsed.
    pub fn from_rows(rows: &[Vec<Value>]) -> Result<Self, MapError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * rows.len());

        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(MapError::RaggedRow {
                    row,
                    found: values.len(),
                    expected: width,
                });
            }
            for (col, value) in values.iter().enumerate() {
                let tile = Tile::from_tuple(value).unwrap_or_else(|| {
                    warn!("malformed tile at ({col}, {row}): {value}");
                    Tile::default()
                });
                cells.push(tile);
            }
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            cells,
        })
    }

    pub fn to_json(&self) -> String {
        let rows: Vec<Value> = (0..self.height)
            .map(|row| {
                Value::Array(
                    (0..self.width)
                        .filter_map(|col| self.get(col, row).map(Tile::to_tuple))
                        .collect(),
                )
            })
            .collect();
        Value::Array(rows).to_string()
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.width && row < self.height
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        self.in_bounds(col, row).then(|| (row * self.width + col) as usize)
    }

    pub fn get(&self, col: i32, row: i32) -> Option<&Tile> {
        self.index(col, row).and_then(|i| self.cells.get(i))
    }

    /// Replace a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, col: i32, row: i32, tile: Tile) {
        if let Some(cell) = self.index(col, row).and_then(|i| self.cells.get_mut(i)) {
            *cell = tile;
        }
    }

    /// Iterate `(col, row, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &Tile)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i as i32 % width, i as i32 / width, tile))
    }
}
