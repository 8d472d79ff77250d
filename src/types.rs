//! Entity types: what each kind of map object spawns as and how it reacts
//! when something walks into it.
//!
//! Handlers are looked up by `EntityKind` in a `TypeRegistry` that the
//! world resolves once at construction.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::components::*;
use crate::events::SimEvent;
use crate::world::{EntityId, SimulationWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Guard,
    Crate,
    Barrel,
    Chest,
    Coin,
    Portal,
    Campfire,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Player,
        EntityKind::Guard,
        EntityKind::Crate,
        EntityKind::Barrel,
        EntityKind::Chest,
        EntityKind::Coin,
        EntityKind::Portal,
        EntityKind::Campfire,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Guard => "guard",
            EntityKind::Crate => "crate",
            EntityKind::Barrel => "barrel",
            EntityKind::Chest => "chest",
            EntityKind::Coin => "coin",
            EntityKind::Portal => "portal",
            EntityKind::Campfire => "campfire",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Where and with which authored properties to spawn an entity.
#[derive(Debug, Clone, Default)]
pub struct SpawnArgs {
    pub col: i32,
    pub row: i32,
    /// Per-instance properties from the level (portal target, patrol code, ...).
    pub props: Map<String, Value>,
}

impl SpawnArgs {
    pub fn at(col: i32, row: i32) -> Self {
        Self {
            col,
            row,
            props: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_owned(), value.into());
        self
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.col, self.row)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.props.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.props.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// Behaviour of one kind of entity.
pub trait EntityTypeHandler {
    fn kind(&self) -> EntityKind;

    /// Create the entity and return its id.
    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId;

    /// `mover` tried to step into `entity`'s solid cell.
    fn on_collision(&self, _world: &mut SimulationWorld, _entity: EntityId, _mover: EntityId) {}
}

/// Handlers keyed by kind.
#[derive(Default)]
pub struct TypeRegistry {
    handlers: HashMap<EntityKind, Box<dyn EntityTypeHandler>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every built-in kind.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PlayerType));
        registry.register(Box::new(GuardType));
        registry.register(Box::new(CrateType));
        registry.register(Box::new(BarrelType));
        registry.register(Box::new(ChestType));
        registry.register(Box::new(CoinType));
        registry.register(Box::new(PortalType));
        registry.register(Box::new(CampfireType));
        registry
    }

    /// Install a handler, returning the one it replaces.
    pub fn register(&mut self, handler: Box<dyn EntityTypeHandler>) -> Option<Box<dyn EntityTypeHandler>> {
        self.handlers.insert(handler.kind(), handler)
    }

    pub fn get(&self, kind: EntityKind) -> Option<&dyn EntityTypeHandler> {
        self.handlers.get(&kind).map(|h| h.as_ref())
    }

    pub fn spawn(&self, world: &mut SimulationWorld, kind: EntityKind, args: &SpawnArgs) -> Option<EntityId> {
        match self.get(kind) {
            Some(handler) => Some(handler.spawn(world, args)),
            None => {
                warn!("no handler registered for {}", kind.name());
                None
            }
        }
    }

    /// Dispatch a collision to the handler of `entity`'s kind, if it has one.
    pub fn on_collision(&self, world: &mut SimulationWorld, entity: EntityId, mover: EntityId) {
        let Some(EntityType(kind)) = world.get::<EntityType>(entity).copied() else {
            return;
        };
        if let Some(handler) = self.get(kind) {
            handler.on_collision(world, entity, mover);
        }
    }
}

// ============================================================================
// BUILT-IN TYPES
// ============================================================================

pub struct PlayerType;

impl EntityTypeHandler for PlayerType {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        let id = world.create_entity((
            args.loc(),
            EntityType(EntityKind::Player),
            Sprite::new('@' as u32, 15, 0).with_depth(10),
            Player,
            Solid,
            Direction::new(0, 1),
            Health::new(args.f32_or("health", 10.0)),
            Attack { value: 1.0 },
            AttackTarget,
        ));
        world.set_player(Some(id));
        id
    }
}

/// Hostile AI. Props: `path` (patrol code), `mode` (once/loop/pingpong),
/// `loots`, `health`.
pub struct GuardType;

impl EntityTypeHandler for GuardType {
    fn kind(&self) -> EntityKind {
        EntityKind::Guard
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        let patrol_mode = args
            .props
            .get("mode")
            .and_then(|v| serde_json::from_value::<PathMode>(v.clone()).ok())
            .unwrap_or(PathMode::PingPong);
        let mut ai = match args.str("path") {
            Some(code) => Ai::patrolling(code, patrol_mode),
            None => Ai::default(),
        };
        ai.loots = args.bool_or("loots", false);

        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Guard),
            Sprite::new('G' as u32, 12, 0).with_depth(5),
            Solid,
            Direction::new(0, 1),
            Health::new(args.f32_or("health", 3.0)),
            Attack { value: args.f32_or("attack", 1.0) },
            AttackTarget,
            ai,
        ))
    }
}

pub struct CrateType;

impl EntityTypeHandler for CrateType {
    fn kind(&self) -> EntityKind {
        EntityKind::Crate
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Crate),
            Sprite::new('=' as u32, 6, 0).with_depth(2),
            Solid,
            Pushable,
            Flammable::default(),
        ))
    }
}

pub struct BarrelType;

impl EntityTypeHandler for BarrelType {
    fn kind(&self) -> EntityKind {
        EntityKind::Barrel
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Barrel),
            Sprite::new('0' as u32, 3, 0).with_depth(2),
            Solid,
            Pushable,
            Flammable {
                temperature: args.f32_or("temperature", 0.0),
            },
        ))
    }
}

/// Opens once when bumped and shows its `message` prop.
pub struct ChestType;

impl EntityTypeHandler for ChestType {
    fn kind(&self) -> EntityKind {
        EntityKind::Chest
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        let text = args.str("message").unwrap_or("The chest is empty.");
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Chest),
            Sprite::new('&' as u32, 14, 0).with_depth(2),
            Solid,
            Message::new(text),
        ))
    }

    fn on_collision(&self, world: &mut SimulationWorld, entity: EntityId, mover: EntityId) {
        // The dialog may still be on screen when the mover bumps again.
        if world.has::<Opened>(entity) || !world.has::<Player>(mover) {
            return;
        }
        world.add(entity, Opened);
        if let Some(mut sprite) = world.get_mut::<Sprite>(entity) {
            sprite.tile = '_' as u32;
        }
        let text = world.get::<Message>(entity).map(|m| m.text.clone()).unwrap_or_default();
        debug!("chest {entity:?} opened by {mover:?}");
        world.sfx("open");
        world.emit(SimEvent::Dialog(text));
    }
}

pub struct CoinType;

impl EntityTypeHandler for CoinType {
    fn kind(&self) -> EntityKind {
        EntityKind::Coin
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        let mut pickup = Pickup::new(args.str("kind").unwrap_or("coin"));
        if let Some(Value::Object(atts)) = args.props.get("atts") {
            pickup.atts = atts.clone();
        }
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Coin),
            Sprite::new('$' as u32, 14, 0).with_depth(1),
            pickup,
        ))
    }
}

/// Props: `name`, `target` (name of the destination portal).
pub struct PortalType;

impl EntityTypeHandler for PortalType {
    fn kind(&self) -> EntityKind {
        EntityKind::Portal
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Portal),
            Sprite::new('O' as u32, 13, 0),
            Portal {
                name: args.str("name").map(str::to_owned),
                target: args.str("target").unwrap_or_default().to_owned(),
            },
        ))
    }
}

/// A fire that burns until its optional `duration` prop runs out.
pub struct CampfireType;

impl EntityTypeHandler for CampfireType {
    fn kind(&self) -> EntityKind {
        EntityKind::Campfire
    }

    fn spawn(&self, world: &mut SimulationWorld, args: &SpawnArgs) -> EntityId {
        world.create_entity((
            args.loc(),
            EntityType(EntityKind::Campfire),
            Sprite::new('^' as u32, 9, 0).with_depth(3),
            Fire {
                duration: args.f32_or("duration", f32::INFINITY),
            },
        ))
    }
}
