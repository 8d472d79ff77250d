//! Basic demonstration of the mapper simulation.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_demo

use mapper_sim::host::KeyState;
use mapper_sim::{Audio, Renderer, SimEvent, Simulation};

const LEVEL: &str = r##"{
    "map": [
        [["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1]],
        [["#",7,0,1],["."],["."],["."],["."],["."],["."],["."],["."],["#",7,0,1]],
        [["#",7,0,1],["."],["."],["."],["."],["."],["."],["."],["."],["#",7,0,1]],
        [["#",7,0,1],["."],["."],["."],["."],["."],["."],["."],["."],["#",7,0,1]],
        [["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1],["#",7,0,1]]
    ],
    "entities": [
        {"kind": "player", "col": 1, "row": 2},
        {"kind": "guard", "col": 8, "row": 1, "props": {"path": "D2 P FL L2", "mode": "pingpong"}},
        {"kind": "campfire", "col": 5, "row": 3, "props": {"duration": 4.0}},
        {"kind": "barrel", "col": 6, "row": 3},
        {"kind": "crate", "col": 2, "row": 2},
        {"kind": "coin", "col": 4, "row": 1}
    ],
    "music": "theme"
}"##;

/// Renders into a char buffer and prints it.
struct TextScreen {
    width: usize,
    cells: Vec<char>,
}

impl TextScreen {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            cells: vec![' '; width * height],
        }
    }

    fn print(&self) {
        for line in self.cells.chunks(self.width) {
            println!("  {}", line.iter().collect::<String>());
        }
    }
}

impl Renderer for TextScreen {
    fn draw_tile(&mut self, tile: u32, col: i32, row: i32, _fg: u8, _bg: u8) {
        let index = row as usize * self.width + col as usize;
        if let (Some(cell), Some(ch)) = (self.cells.get_mut(index), char::from_u32(tile)) {
            *cell = if ch == '\0' { '.' } else { ch };
        }
    }

    fn draw_tile_px(&mut self, tile: u32, x: i32, y: i32, fg: u8, bg: u8) {
        self.draw_tile(tile, x / 8, y / 8, fg, bg);
    }
}

struct ConsoleAudio;

impl Audio for ConsoleAudio {
    fn play_sfx(&mut self, name: &str) {
        println!("  * sfx: {name}");
    }

    fn play_music(&mut self, pattern: &str) {
        println!("  * music: {pattern}");
    }

    fn stop_music(&mut self) {
        println!("  * music stopped");
    }
}

fn main() {
    env_logger::init();
    println!("=== Mapper - Simulation Demo ===\n");

    let mut sim = Simulation::new();
    if let Err(err) = sim.load_level(LEVEL) {
        eprintln!("level failed to load: {err}");
        return;
    }

    let mut keys = KeyState::new();
    let moves = ["right", "right", "up", "right", "right", "down"];

    for frame in 0..60 {
        if let Some(key) = moves.get(frame / 5).filter(|_| frame % 5 == 0) {
            keys.press(key);
        }
        if let Some(outcome) = sim.handle_input(&keys) {
            println!("frame {frame}: player move -> {outcome:?}");
        }
        keys.end_frame();
        for key in moves {
            keys.release(key);
        }

        sim.step(0.1);

        for event in sim.flush_audio(&mut ConsoleAudio) {
            match event {
                SimEvent::Dialog(text) => println!("  \"{text}\""),
                SimEvent::GameOver => println!("  GAME OVER"),
                _ => {}
            }
        }

        if (frame + 1) % 20 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            let map = sim.world().map();
            let mut screen = TextScreen::new(map.width as usize, map.height as usize);
            sim.render(&mut screen);
            screen.print();
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}
