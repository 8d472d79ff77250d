//! Serializable views of simulation state for hosts and tooling.

use serde::{Deserialize, Serialize};

use crate::components::{Health, Loc};
use crate::host::sorted_sprites;
use crate::inventory::Inventory;
use crate::world::SimulationWorld;

/// One located sprite, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSnapshot {
    pub col: i32,
    pub row: i32,
    pub tile: u32,
    pub fg: u8,
    pub bg: u8,
    pub depth: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub col: i32,
    pub row: i32,
    pub health: f32,
    pub health_max: f32,
}

/// Complete per-frame picture of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f32,
    pub sprites: Vec<SpriteSnapshot>,
    pub player: Option<PlayerSnapshot>,
    pub inventory: Inventory,
    pub game_over: bool,
}

impl Snapshot {
    pub fn from_world(world: &mut SimulationWorld, tick: u64, time: f32) -> Self {
        let sprites = sorted_sprites(world)
            .into_iter()
            .map(|(loc, sprite)| SpriteSnapshot {
                col: loc.col,
                row: loc.row,
                tile: sprite.tile,
                fg: sprite.fg,
                bg: sprite.bg,
                depth: sprite.depth,
            })
            .collect();

        let player = world.player().and_then(|id| {
            let Loc { col, row } = world.loc(id)?;
            let health = world.get::<Health>(id).copied().unwrap_or_default();
            Some(PlayerSnapshot {
                col,
                row,
                health: health.value,
                health_max: health.max,
            })
        });

        Self {
            tick,
            time,
            sprites,
            player,
            inventory: world.inventory().clone(),
            game_over: world.is_game_over(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read back a snapshot written by `to_json`, e.g. by a replay viewer.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
