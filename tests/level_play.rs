//! Whole-level runs through `Simulation`.

use mapper_sim::host::KeyState;
use mapper_sim::*;

#[derive(Default)]
struct SoundLog(Vec<String>);

impl Audio for SoundLog {
    fn play_sfx(&mut self, name: &str) {
        self.0.push(name.to_owned());
    }

    fn play_music(&mut self, pattern: &str) {
        self.0.push(format!("music:{pattern}"));
    }

    fn stop_music(&mut self) {
        self.0.push("music:stop".to_owned());
    }
}

fn open_rows(width: usize, height: usize) -> String {
    let row = vec![r#"["."]"#; width].join(",");
    let rows = vec![format!("[{row}]"); height].join(",");
    format!("[{rows}]")
}

fn level(width: usize, height: usize, entities: &str) -> String {
    format!(r#"{{"map": {}, "entities": {entities}}}"#, open_rows(width, height))
}

#[test]
fn guard_beats_idle_player_to_game_over() {
    let mut sim = Simulation::new();
    let ids = sim
        .load_level(&level(
            4,
            1,
            r#"[{"kind": "player", "col": 0, "row": 0}, {"kind": "guard", "col": 1, "row": 0}]"#,
        ))
        .unwrap();
    let (player, guard) = (ids[0], ids[1]);
    let mut sounds = SoundLog::default();
    let mut events = Vec::new();

    for _ in 0..150 {
        sim.step(0.1);
        events.extend(sim.flush_audio(&mut sounds));
    }

    assert!(sim.world().is_game_over());
    assert!(sim.world().contains(player));
    assert_eq!(sim.world().get::<Ai>(guard).unwrap().mode, AiMode::Attack);
    assert_eq!(events.iter().filter(|e| **e == SimEvent::GameOver).count(), 1);
    assert!(sounds.0.contains(&"hit".to_owned()));
    assert!(sounds.0.contains(&"gameover".to_owned()));

    // Input is ignored once the game is over.
    let mut keys = KeyState::new();
    keys.press("right");
    assert_eq!(sim.handle_input(&keys), None);
}

#[test]
fn player_defeats_guard_with_bump_attacks() {
    let mut sim = Simulation::new();
    let ids = sim
        .load_level(&level(
            4,
            1,
            r#"[{"kind": "player", "col": 0, "row": 0}, {"kind": "guard", "col": 1, "row": 0, "props": {"health": 2, "attack": 0}}]"#,
        ))
        .unwrap();
    let guard = ids[1];
    let mut keys = KeyState::new();

    for _ in 0..10 {
        keys.press("right");
        sim.handle_input(&keys);
        keys.end_frame();
        keys.release("right");
        sim.step(0.1);
    }

    assert!(!sim.world().contains(guard));
    let events = sim.world_mut().drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::Defeated { entity, at: Some(at) } if *entity == guard && *at == Loc::new(1, 0))));
}

#[test]
fn patrolling_guard_walks_its_route() {
    let mut sim = Simulation::new();
    let ids = sim
        .load_level(&level(
            6,
            3,
            r#"[{"kind": "guard", "col": 0, "row": 0, "props": {"path": "R3", "mode": "once"}}]"#,
        ))
        .unwrap();
    let guard = ids[0];

    for _ in 0..30 {
        sim.step(0.1);
    }

    assert_eq!(sim.world().loc(guard), Some(Loc::new(3, 0)));
    assert_eq!(sim.world().get::<Direction>(guard), Some(&Direction::new(1, 0)));
}

#[test]
fn portal_pair_carries_the_player() {
    let mut sim = Simulation::new();
    let ids = sim
        .load_level(&level(
            7,
            3,
            r#"[
                {"kind": "player", "col": 0, "row": 1},
                {"kind": "portal", "col": 1, "row": 1, "props": {"name": "a", "target": "b"}},
                {"kind": "portal", "col": 5, "row": 1, "props": {"name": "b", "target": "a"}}
            ]"#,
        ))
        .unwrap();
    let mut keys = KeyState::new();
    keys.press("right");

    let outcome = sim.handle_input(&keys);

    assert_eq!(outcome, Some(MoveOutcome::Teleported(Loc::new(5, 1))));
    assert_eq!(sim.world().loc(ids[0]), Some(Loc::new(5, 1)));
}

#[test]
fn spatial_grid_stays_consistent_under_random_play() {
    let mut sim = Simulation::new();
    sim.load_level(&level(
        8,
        6,
        r#"[
            {"kind": "player", "col": 1, "row": 1},
            {"kind": "guard", "col": 6, "row": 4, "props": {"path": "L3 U2 R3 D2", "mode": "loop"}},
            {"kind": "guard", "col": 5, "row": 1, "props": {"loots": true}},
            {"kind": "crate", "col": 3, "row": 3},
            {"kind": "barrel", "col": 2, "row": 4},
            {"kind": "barrel", "col": 3, "row": 4},
            {"kind": "campfire", "col": 1, "row": 4, "props": {"duration": 3.0}},
            {"kind": "coin", "col": 4, "row": 2},
            {"kind": "coin", "col": 7, "row": 0}
        ]"#,
    ))
    .unwrap();
    let mut rng = fastrand::Rng::with_seed(7);
    let arrows = ["up", "down", "left", "right"];

    for _ in 0..300 {
        let mut keys = KeyState::new();
        keys.press(arrows[rng.usize(0..arrows.len())]);
        if rng.bool() {
            keys.press("pull");
        }
        sim.handle_input(&keys);
        sim.step(0.1);

        let world = sim.world_mut();
        let located = world.bucket::<Loc>();
        assert_eq!(world.grid().total_count(), located.len());
        for (id, loc) in located {
            assert_eq!(world.grid().cell_of(id), Some((loc.col, loc.row)));
            assert_eq!(world.entities_at(loc.col, loc.row).iter().filter(|e| **e == id).count(), 1);
        }
    }
}

#[test]
fn empty_cells_report_no_entities() {
    let mut sim = Simulation::new();
    let ids = sim
        .load_level(&level(3, 3, r#"[{"kind": "crate", "col": 1, "row": 1}]"#))
        .unwrap();

    assert!(sim.world().entities_at(0, 0).is_empty());
    assert!(sim.world().entities_at(-5, 99).is_empty());

    sim.world_mut().remove_entity(ids[0]);
    assert!(sim.world().entities_at(1, 1).is_empty());
}
