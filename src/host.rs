//! Host collaborators: drawing, sound, input and storage.
//!
//! The simulation never talks to a screen, speaker or disk itself. A host
//! implements these traits and the driver hands them in at the boundary.

use log::warn;
use std::collections::{HashMap, HashSet};

use crate::components::{Loc, Sprite};
use crate::events::SimEvent;
use crate::world::SimulationWorld;

/// Draws one glyph with a palette pair.
pub trait Renderer {
    fn draw_tile(&mut self, tile: u32, col: i32, row: i32, fg: u8, bg: u8);

    /// Pixel-positioned variant, for hosts that scroll smoothly.
    fn draw_tile_px(&mut self, tile: u32, x: i32, y: i32, fg: u8, bg: u8);
}

/// Fire-and-forget sound.
pub trait Audio {
    fn play_sfx(&mut self, name: &str);
    fn play_music(&mut self, pattern: &str);
    fn stop_music(&mut self);
}

/// Read-only key state for the current frame.
pub trait Input {
    fn key_held(&self, name: &str) -> bool;
    fn key_just_pressed(&self, name: &str) -> bool;
}

/// Opaque blob storage for game-level progress.
pub trait Persistence {
    fn save(&mut self, key: &str, blob: &str);
    fn load(&self, key: &str) -> Option<String>;
}

/// Names the audio host knows how to play.
pub const SFX_LIBRARY: &[&str] = &[
    "hit", "defeat", "fire", "pickup", "open", "push", "teleport", "gameover",
];

// ============================================================================
// RENDERING
// ============================================================================

/// Draw the map, then every sprite with a `Loc`, lowest depth first.
///
/// Sprites of equal depth draw in entity order.
pub fn render_world(world: &mut SimulationWorld, renderer: &mut dyn Renderer) {
    for (col, row, tile) in world.map().iter() {
        renderer.draw_tile(tile.tile, col, row, tile.fg, tile.bg);
    }
    for (loc, sprite) in sorted_sprites(world) {
        renderer.draw_tile(sprite.tile, loc.col, loc.row, sprite.fg, sprite.bg);
    }
}

/// `render_world` in pixel space, shifted by a scroll offset.
pub fn render_world_scrolled(
    world: &mut SimulationWorld,
    renderer: &mut dyn Renderer,
    tile_px: i32,
    scroll: (i32, i32),
) {
    let to_px = |col: i32, row: i32| (col * tile_px - scroll.0, row * tile_px - scroll.1);
    for (col, row, tile) in world.map().iter() {
        let (x, y) = to_px(col, row);
        renderer.draw_tile_px(tile.tile, x, y, tile.fg, tile.bg);
    }
    for (loc, sprite) in sorted_sprites(world) {
        let (x, y) = to_px(loc.col, loc.row);
        renderer.draw_tile_px(sprite.tile, x, y, sprite.fg, sprite.bg);
    }
}

/// Located sprites in draw order.
pub fn sorted_sprites(world: &mut SimulationWorld) -> Vec<(Loc, Sprite)> {
    let mut sprites: Vec<_> = world
        .bucket::<Sprite>()
        .into_iter()
        .filter_map(|(id, sprite)| world.loc(id).map(|loc| (loc, sprite)))
        .collect();
    // Stable: bucket order is entity order.
    sprites.sort_by_key(|(_, sprite)| sprite.depth);
    sprites
}

// ============================================================================
// AUDIO
// ============================================================================

/// Forward the audio events among `events` to the host.
///
/// Effect names outside `SFX_LIBRARY` are logged and skipped.
pub fn dispatch_audio(events: &[SimEvent], audio: &mut dyn Audio) {
    for event in events {
        match event {
            SimEvent::Sfx(name) if SFX_LIBRARY.contains(&name.as_str()) => audio.play_sfx(name),
            SimEvent::Sfx(name) => warn!("unknown sound effect '{name}'"),
            SimEvent::Music(Some(pattern)) => audio.play_music(pattern),
            SimEvent::Music(None) => audio.stop_music(),
            SimEvent::GameOver => audio.play_sfx("gameover"),
            _ => {}
        }
    }
}

// ============================================================================
// SIMPLE HOST IMPLEMENTATIONS
// ============================================================================

/// Key state a host fills in each frame.
#[derive(Debug, Default, Clone)]
pub struct KeyState {
    held: HashSet<String>,
    just_pressed: HashSet<String>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as pressed this frame (and held).
    pub fn press(&mut self, name: &str) {
        self.held.insert(name.to_owned());
        self.just_pressed.insert(name.to_owned());
    }

    pub fn release(&mut self, name: &str) {
        self.held.remove(name);
    }

    /// Forget edge-triggered presses; call once per frame after the tick.
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

impl Input for KeyState {
    fn key_held(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    fn key_just_pressed(&self, name: &str) -> bool {
        self.just_pressed.contains(name)
    }
}

/// In-memory persistence, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl Persistence for MemoryStore {
    fn save(&mut self, key: &str, blob: &str) {
        self.blobs.insert(key.to_owned(), blob.to_owned());
    }

    fn load(&self, key: &str) -> Option<String> {
        self.blobs.get(key).cloned()
    }
}
