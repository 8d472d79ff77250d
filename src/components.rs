//! ECS components for the grid simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::path::PathStep;
use crate::types::EntityKind;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Grid position.
///
/// `Loc` is the only component whose writes have side effects: the world's
/// spatial grid must always agree with it. Move entities with
/// `SimulationWorld::set_loc`, never by editing the fields.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Loc {
    pub col: i32,
    pub row: i32,
}

impl Loc {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.col + dx, self.row + dy)
    }

    pub fn manhattan(&self, other: &Loc) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// One of the four grid facings, written as the path-code letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    U,
    D,
    L,
    R,
}

impl Facing {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'U' => Some(Facing::U),
            'D' => Some(Facing::D),
            'L' => Some(Facing::L),
            'R' => Some(Facing::R),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Facing::U => 'U',
            Facing::D => 'D',
            Facing::L => 'L',
            Facing::R => 'R',
        }
    }

    /// Unit step for this facing. Rows grow downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::U => (0, -1),
            Facing::D => (0, 1),
            Facing::L => (-1, 0),
            Facing::R => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Facing::U),
            (0, 1) => Some(Facing::D),
            (-1, 0) => Some(Facing::L),
            (1, 0) => Some(Facing::R),
            _ => None,
        }
    }
}

/// Facing vector: one of the four unit vectors, or zero.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub dx: i32,
    pub dy: i32,
}

impl Direction {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    pub fn reversed(&self) -> Self {
        Self::new(-self.dx, -self.dy)
    }

    pub fn facing(&self) -> Option<Facing> {
        Facing::from_delta(self.dx, self.dy)
    }
}

impl From<Facing> for Direction {
    fn from(facing: Facing) -> Self {
        let (dx, dy) = facing.delta();
        Self { dx, dy }
    }
}

// ============================================================================
// IDENTITY / PRESENTATION COMPONENTS
// ============================================================================

/// Which registered entity type produced this entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType(pub EntityKind);

/// Glyph drawn at the entity's cell.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sprite {
    pub tile: u32,
    pub fg: u8,
    pub bg: u8,
    /// Draw order; higher values draw later (on top).
    pub depth: i32,
}

impl Sprite {
    pub fn new(tile: u32, fg: u8, bg: u8) -> Self {
        Self { tile, fg, bg, depth: 0 }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }
}

/// Marker for the player-controlled entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Blocks movement into this cell.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Solid;

/// Can be pushed and pulled by movers.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pushable;

/// Set once a one-shot interaction (opening a chest) has fired.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Opened;

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub value: f32,
    pub max: f32,
    /// Remaining invulnerability after a hit.
    pub cooldown_timer: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            value: max,
            max,
            cooldown_timer: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.value > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.value -= amount;
    }

    pub fn heal(&mut self, amount: f32) {
        self.value = (self.value + amount).min(self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(10.0)
    }
}

/// Damage dealt by a bump attack.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub value: f32,
}

/// Marks an entity that bump attacks may hit.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AttackTarget;

// ============================================================================
// MOVEMENT / AI COMPONENTS
// ============================================================================

/// How a path follower behaves when it reaches either end of its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// Stop on the last step.
    #[default]
    Once,
    /// Wrap back to the first step.
    Loop,
    /// Reverse direction at either end.
    PingPong,
}

/// Walks an entity through a list of path steps on a fixed timer.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PathFollower {
    pub steps: Vec<PathStep>,
    pub index: usize,
    pub mode: PathMode,
    /// +1 walking forward, -1 walking back (ping-pong only).
    pub dir_step: i32,
    /// Seconds until the next step.
    pub timer: f32,
    /// Seconds between steps.
    pub interval: f32,
    /// Set when the last attempted step was blocked.
    pub stalled: bool,
    /// Set when a `Once` path has taken its final step.
    pub finished: bool,
}

impl PathFollower {
    pub fn new(steps: Vec<PathStep>, mode: PathMode, interval: f32) -> Self {
        let finished = steps.is_empty();
        Self {
            steps,
            index: 0,
            mode,
            dir_step: 1,
            timer: interval,
            interval,
            stalled: false,
            finished,
        }
    }

    pub fn current(&self) -> Option<&PathStep> {
        self.steps.get(self.index)
    }

    /// True while the follower still has steps to take.
    pub fn is_active(&self) -> bool {
        !self.finished && !self.stalled
    }

    /// Move `index` to the next step according to `mode`.
    pub fn advance(&mut self) {
        let len = self.steps.len();
        if len == 0 {
            self.finished = true;
            return;
        }
        let last = len - 1;
        match self.mode {
            PathMode::Once => {
                if self.index >= last {
                    self.index = last;
                    self.finished = true;
                } else {
                    self.index += 1;
                }
            }
            PathMode::Loop => {
                self.index = if self.index >= last { 0 } else { self.index + 1 };
            }
            PathMode::PingPong => {
                if last == 0 {
                    return;
                }
                if (self.dir_step > 0 && self.index >= last) || (self.dir_step < 0 && self.index == 0) {
                    self.dir_step = -self.dir_step;
                }
                self.index = (self.index as i64 + self.dir_step as i64).clamp(0, last as i64) as usize;
            }
        }
    }
}

/// High-level AI behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiMode {
    #[default]
    Wander,
    Patrol,
    Chase,
    Attack,
    Flee,
    Loot,
}

/// AI brain state.
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct Ai {
    pub mode: AiMode,
    /// Scripted path code walked while patrolling.
    pub patrol: Option<String>,
    pub patrol_mode: PathMode,
    /// Cell and facing the patrol route is compiled from, fixed on the
    /// first patrol plan.
    pub patrol_origin: Option<(Loc, Facing)>,
    /// Set while walking back to `patrol_origin` before resuming the route.
    pub returning: bool,
    /// Whether this entity goes after visible pickups when idle.
    pub loots: bool,
    /// Target cell the current chase path was planned against.
    pub chase_goal: Option<Loc>,
}

impl Ai {
    pub fn patrolling(code: impl Into<String>, mode: PathMode) -> Self {
        Self {
            mode: AiMode::Patrol,
            patrol: Some(code.into()),
            patrol_mode: mode,
            ..Default::default()
        }
    }
}

// ============================================================================
// FIRE COMPONENTS
// ============================================================================

/// A burning cell.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fire {
    pub duration: f32,
}

/// Flame attached to a burning entity, following it around.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FireSmall {
    pub duration: f32,
    pub parent: Entity,
}

/// Heats up next to fire and ignites at the configured threshold.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Flammable {
    pub temperature: f32,
}

/// Marker for entities currently carrying a `FireSmall`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct OnFire;

// ============================================================================
// WORLD OBJECT COMPONENTS
// ============================================================================

#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub name: Option<String>,
    /// Name of the portal this one sends movers to.
    pub target: String,
}

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: String,
    /// Remove the pickup once collected.
    pub consume: bool,
    /// Attributes merged into the inventory flags on collection.
    #[serde(default)]
    pub atts: serde_json::Map<String, serde_json::Value>,
}

impl Pickup {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            consume: true,
            atts: serde_json::Map::new(),
        }
    }
}

/// Text shown when the entity is interacted with.
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Short-lived visual effect.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub timer: f32,
}
