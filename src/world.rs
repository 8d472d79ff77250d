//! The simulation world: entity/component store, spatial index and system
//! registry in one explicitly constructed value.
//!
//! Component storage is a `bevy_ecs::World`. The spatial grid is kept next to
//! it and is only ever updated through this type, which is what keeps the
//! two in agreement:
//!
//! - every entity with a `Loc` is listed in exactly one grid cell, the one
//!   matching its `Loc`;
//! - entities without a `Loc` are not in the grid.

use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use log::{info, warn};
use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::components::Loc;
use crate::config::SimConfig;
use crate::events::{EventBuffer, SimEvent};
use crate::inventory::Inventory;
use crate::spatial::SpatialGrid;
use crate::tilemap::TileMap;
use crate::types::TypeRegistry;

#[cfg(feature = "profile")]
use crate::profiler::Profiler;

/// Opaque entity identifier.
pub type EntityId = Entity;

/// A per-tick system. Receives the world and the frame delta in seconds.
pub type SystemFn = fn(&mut SimulationWorld, f32);

/// Creation sequence number. bevy recycles despawned indices, so `Entity`
/// ordering stops matching creation order once anything has been removed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SpawnSeq(u64);

struct RegisteredSystem {
    name: String,
    func: SystemFn,
    order: i32,
    /// Registration sequence, used to break ties between equal orders.
    seq: u64,
}

pub struct SimulationWorld {
    world: World,
    grid: SpatialGrid,
    systems: Vec<RegisteredSystem>,
    next_system_seq: u64,
    next_spawn_seq: u64,
    map: TileMap,
    events: EventBuffer,
    player: Option<EntityId>,
    config: SimConfig,
    rng: fastrand::Rng,
    types: Rc<TypeRegistry>,
    inventory: Inventory,
    /// Time banked toward the next AI think pass.
    pub(crate) ai_clock: f32,
    pub(crate) game_over: bool,
    #[cfg(feature = "profile")]
    profiler: Profiler,
}

impl SimulationWorld {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let rng = fastrand::Rng::with_seed(config.seed);
        Self {
            world: World::new(),
            grid: SpatialGrid::new(),
            systems: Vec::new(),
            next_system_seq: 0,
            next_spawn_seq: 0,
            map: TileMap::default(),
            events: EventBuffer::default(),
            player: None,
            config,
            rng,
            types: Rc::new(TypeRegistry::with_builtin()),
            inventory: Inventory::default(),
            ai_clock: 0.0,
            game_over: false,
            #[cfg(feature = "profile")]
            profiler: Profiler::new(),
        }
    }

    // ------------------------------------------------------------------
    // Entities and components
    // ------------------------------------------------------------------

    /// Spawn an entity from a bundle of components.
    ///
    /// A `Loc` in the bundle places the entity on the grid.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> EntityId {
        let seq = SpawnSeq(self.next_spawn_seq);
        self.next_spawn_seq += 1;
        let id = self.world.spawn((bundle, seq)).id();
        if let Some(loc) = self.world.get::<Loc>(id).copied() {
            self.grid.place(id, loc.col, loc.row);
        }
        id
    }

    /// True while `id` refers to a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.world.entities().contains(id)
    }

    /// Attach or overwrite a component.
    ///
    /// Adding a `Loc` relocates the entity on the grid. Adding to an entity
    /// that no longer exists is logged and ignored.
    pub fn add<C: Component>(&mut self, id: EntityId, component: C) {
        if !self.contains(id) {
            warn!("add {} to missing entity {id:?}", std::any::type_name::<C>());
            return;
        }
        let loc = (&component as &dyn Any).downcast_ref::<Loc>().copied();
        self.world.entity_mut(id).insert(component);
        if let Some(loc) = loc {
            self.grid.place(id, loc.col, loc.row);
        }
    }

    /// Move an entity that already has a `Loc`.
    ///
    /// This is the only way to change a `Loc` in place.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no `Loc` component.
    pub fn set_loc(&mut self, id: EntityId, col: i32, row: i32) {
        let Some(mut loc) = self.world.get_mut::<Loc>(id) else {
            panic!("set_loc on entity {id:?} which has no Loc component");
        };
        loc.col = col;
        loc.row = row;
        self.grid.place(id, col, row);
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.world.get::<C>(id)
    }

    /// Mutable access to a component.
    ///
    /// # Panics
    ///
    /// Panics when `C` is `Loc`; use `set_loc` so the grid stays in sync.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<Mut<'_, C>> {
        assert!(
            TypeId::of::<C>() != TypeId::of::<Loc>(),
            "Loc must be changed through set_loc"
        );
        self.world.get_mut::<C>(id)
    }

    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.world.get::<C>(id).is_some()
    }

    /// Copy of an entity's position.
    pub fn loc(&self, id: EntityId) -> Option<Loc> {
        self.world.get::<Loc>(id).copied()
    }

    pub fn remove_component<C: Component>(&mut self, id: EntityId) {
        if !self.contains(id) {
            return;
        }
        self.world.entity_mut(id).remove::<C>();
        if TypeId::of::<C>() == TypeId::of::<Loc>() {
            self.grid.remove(id);
        }
    }

    /// Destroy an entity and drop it from the grid.
    pub fn remove_entity(&mut self, id: EntityId) {
        self.grid.remove(id);
        if self.contains(id) {
            self.world.despawn(id);
        }
    }

    /// Entities whose `Loc` is this cell. Empty when there are none.
    pub fn entities_at(&self, col: i32, row: i32) -> Vec<EntityId> {
        self.grid.entities_at(col, row)
    }

    /// Every entity matching the filter, e.g. `query::<(With<Fire>, With<Loc>)>()`.
    ///
    /// Returns a snapshot in creation order, so callers may add and remove
    /// entities while walking it.
    pub fn query<F: QueryFilter>(&mut self) -> Vec<EntityId> {
        let mut state = self.world.query_filtered::<(Entity, &SpawnSeq), F>();
        let mut found: Vec<(SpawnSeq, EntityId)> = state.iter(&self.world).map(|(e, seq)| (*seq, e)).collect();
        found.sort_unstable_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, e)| e).collect()
    }

    /// Snapshot of one component bucket, in creation order.
    pub fn bucket<C: Component + Clone>(&mut self) -> Vec<(EntityId, C)> {
        let mut state = self.world.query::<(Entity, &SpawnSeq, &C)>();
        let mut found: Vec<(SpawnSeq, EntityId, C)> = state
            .iter(&self.world)
            .map(|(e, seq, c)| (*seq, e, c.clone()))
            .collect();
        found.sort_unstable_by_key(|(seq, _, _)| *seq);
        found.into_iter().map(|(_, e, c)| (e, c)).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a system. Lower `order` runs first; equal orders run in
    /// registration order. Re-registering a name replaces its function and
    /// order but keeps its original registration slot.
    pub fn add_system(&mut self, name: &str, func: SystemFn, order: i32) {
        if let Some(existing) = self.systems.iter_mut().find(|s| s.name == name) {
            existing.func = func;
            existing.order = order;
        } else {
            self.systems.push(RegisteredSystem {
                name: name.to_owned(),
                func,
                order,
                seq: self.next_system_seq,
            });
            self.next_system_seq += 1;
        }
        self.systems.sort_by_key(|s| (s.order, s.seq));
    }

    /// Unregister a system. Returns whether it was registered.
    pub fn remove_system(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name != name);
        self.systems.len() != before
    }

    /// System names in the order `run` will execute them.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every registered system once.
    pub fn run(&mut self, dt: f32) {
        self.run_filtered(dt, |_| true);
    }

    /// Run the registered systems for which `filter(name)` is true.
    ///
    /// The schedule is fixed when the call starts; systems registered or
    /// removed by a running system take effect on the next call.
    pub fn run_filtered(&mut self, dt: f32, filter: impl Fn(&str) -> bool) {
        let schedule: Vec<(String, SystemFn)> = self
            .systems
            .iter()
            .filter(|s| filter(&s.name))
            .map(|s| (s.name.clone(), s.func))
            .collect();

        for (name, func) in schedule {
            self.run_system(&name, func, dt);
        }

        #[cfg(feature = "profile")]
        self.profiler.tick();
    }

    #[cfg_attr(not(feature = "profile"), allow(unused_variables))]
    fn run_system(&mut self, name: &str, func: SystemFn, dt: f32) {
        #[cfg(feature = "profile")]
        self.profiler.begin_section(name);

        func(self, dt);

        #[cfg(feature = "profile")]
        self.profiler.end_section();
    }

    #[cfg(feature = "profile")]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Clear every entity, component, system and grid cell, and restart
    /// entity ids. The map, configuration, type registry and inventory are
    /// kept.
    pub fn reset(&mut self) {
        self.world = World::new();
        self.grid.clear();
        self.systems.clear();
        self.next_system_seq = 0;
        self.next_spawn_seq = 0;
        self.events.clear();
        self.player = None;
        self.rng = fastrand::Rng::with_seed(self.config.seed);
        self.ai_clock = 0.0;
        self.game_over = false;
        info!("simulation world reset");
    }

    // ------------------------------------------------------------------
    // Shared state
    // ------------------------------------------------------------------

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn set_map(&mut self, map: TileMap) {
        info!("map loaded ({}x{})", map.width, map.height);
        self.map = map;
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player.filter(|p| self.contains(*p))
    }

    pub fn set_player(&mut self, id: Option<EntityId>) {
        self.player = id;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    pub fn types(&self) -> Rc<TypeRegistry> {
        Rc::clone(&self.types)
    }

    pub fn set_types(&mut self, types: TypeRegistry) {
        self.types = Rc::new(types);
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn sfx(&mut self, name: &str) {
        self.events.sfx(name);
    }

    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Direct access to the component storage (for advanced usage).
    pub fn ecs(&self) -> &World {
        &self.world
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;

    fn assert_grid_consistent(world: &mut SimulationWorld) {
        let located = world.bucket::<Loc>();
        assert_eq!(world.grid().total_count(), located.len());
        for (id, loc) in &located {
            let here = world.entities_at(loc.col, loc.row);
            assert_eq!(here.iter().filter(|e| *e == id).count(), 1, "{id:?} not once at {loc:?}");
        }
        for (cell, ids) in world.grid().all_cells() {
            for id in ids {
                assert_eq!(world.loc(*id).map(|l| (l.col, l.row)), Some(*cell));
            }
        }
    }

    #[test]
    fn test_create_with_loc_places_on_grid() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity((Loc::new(2, 3), Solid));
        assert_eq!(world.entities_at(2, 3), vec![e]);
        assert!(world.has::<Solid>(e));
        assert!(!world.has::<Pushable>(e));
    }

    #[test]
    fn test_add_loc_relocates() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Loc::new(0, 0));
        world.add(e, Loc::new(4, 4));
        assert!(world.entities_at(0, 0).is_empty());
        assert_eq!(world.entities_at(4, 4), vec![e]);

        let late = world.create_entity(Solid);
        world.add(late, Loc::new(4, 4));
        assert_eq!(world.entities_at(4, 4), vec![e, late]);
        assert_grid_consistent(&mut world);
    }

    #[test]
    fn test_set_loc_moves_entity() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Loc::new(1, 1));
        world.set_loc(e, 2, 1);
        assert_eq!(world.loc(e), Some(Loc::new(2, 1)));
        assert!(world.entities_at(1, 1).is_empty());
        assert_eq!(world.entities_at(2, 1), vec![e]);
    }

    #[test]
    #[should_panic(expected = "no Loc component")]
    fn test_set_loc_without_loc_panics() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Solid);
        world.set_loc(e, 1, 1);
    }

    #[test]
    #[should_panic(expected = "set_loc")]
    fn test_get_mut_loc_panics() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Loc::new(0, 0));
        let _ = world.get_mut::<Loc>(e);
    }

    #[test]
    fn test_remove_loc_and_entity_clear_grid() {
        let mut world = SimulationWorld::new();
        let a = world.create_entity((Loc::new(1, 1), Solid));
        let b = world.create_entity((Loc::new(1, 1), Solid));

        world.remove_component::<Loc>(a);
        assert_eq!(world.entities_at(1, 1), vec![b]);
        assert!(world.has::<Solid>(a));

        world.remove_entity(b);
        assert!(world.entities_at(1, 1).is_empty());
        assert!(!world.contains(b));
        assert!(!world.has::<Solid>(b));
        assert_grid_consistent(&mut world);
    }

    #[test]
    fn test_components_are_shared_by_reference() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Health::new(10.0));
        world.get_mut::<Health>(e).unwrap().value = 3.0;
        assert_eq!(world.get::<Health>(e).unwrap().value, 3.0);
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let mut world = SimulationWorld::new();
        let e = world.create_entity(Solid);
        assert!(world.get::<Fire>(e).is_none());
        assert!(world.bucket::<Fire>().is_empty());
        assert!(world.query::<With<Fire>>().is_empty());
        assert!(world.entities_at(99, -4).is_empty());

        world.remove_entity(e);
        world.add(e, Solid);
        assert!(!world.contains(e));
    }

    #[test]
    fn test_query_intersection() {
        let mut world = SimulationWorld::new();
        let a = world.create_entity((Solid, Pushable));
        let _b = world.create_entity(Solid);
        let c = world.create_entity((Solid, Pushable, OnFire));

        assert_eq!(world.query::<(With<Solid>, With<Pushable>)>(), vec![a, c]);
        assert_eq!(world.query::<(With<Pushable>, With<Solid>)>(), vec![a, c]);
        assert_eq!(world.query::<(With<OnFire>, With<Solid>)>(), vec![c]);
    }

    #[test]
    fn test_snapshots_keep_creation_order_after_recycling() {
        let mut world = SimulationWorld::new();
        let a = world.create_entity((Solid, Health::new(1.0)));
        let b = world.create_entity((Solid, Health::new(2.0)));
        world.remove_entity(a);
        let c = world.create_entity((Solid, Health::new(3.0)));
        let d = world.create_entity((Solid, Health::new(4.0)));

        assert_eq!(world.query::<With<Solid>>(), vec![b, c, d]);
        let healths: Vec<f32> = world.bucket::<Health>().into_iter().map(|(_, h)| h.max).collect();
        assert_eq!(healths, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_query_matches_has_component_exhaustively() {
        let mut world = SimulationWorld::new();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..40 {
            let e = world.create_entity(Loc::new(rng.i32(0..4), rng.i32(0..4)));
            if rng.bool() {
                world.add(e, Solid);
            }
            if rng.bool() {
                world.add(e, Pushable);
            }
            if rng.bool() {
                world.remove_component::<Loc>(e);
            }
        }
        let found = world.query::<(With<Solid>, With<Pushable>, With<Loc>)>();
        for (e, _) in world.bucket::<Loc>() {
            let expected = world.has::<Solid>(e) && world.has::<Pushable>(e);
            assert_eq!(found.contains(&e), expected);
        }
        assert!(found.iter().all(|e| world.has::<Loc>(*e)));
    }

    #[test]
    fn test_grid_consistency_after_random_operations() {
        let mut world = SimulationWorld::new();
        let mut rng = fastrand::Rng::with_seed(11);
        let mut ids = Vec::new();
        for _ in 0..500 {
            match rng.u8(0..5) {
                0 => ids.push(world.create_entity(Loc::new(rng.i32(0..5), rng.i32(0..5)))),
                1 if !ids.is_empty() => {
                    let e = ids[rng.usize(0..ids.len())];
                    if world.has::<Loc>(e) {
                        world.set_loc(e, rng.i32(0..5), rng.i32(0..5));
                    }
                }
                2 if !ids.is_empty() => {
                    let e = ids[rng.usize(0..ids.len())];
                    world.add(e, Loc::new(rng.i32(0..5), rng.i32(0..5)));
                }
                3 if !ids.is_empty() => {
                    let e = ids[rng.usize(0..ids.len())];
                    world.remove_component::<Loc>(e);
                }
                4 if !ids.is_empty() => {
                    let e = ids.swap_remove(rng.usize(0..ids.len()));
                    world.remove_entity(e);
                }
                _ => {}
            }
        }
        assert_grid_consistent(&mut world);
    }

    fn mark_a(world: &mut SimulationWorld, _dt: f32) {
        world.sfx("a");
    }
    fn mark_b(world: &mut SimulationWorld, _dt: f32) {
        world.sfx("b");
    }
    fn mark_c(world: &mut SimulationWorld, _dt: f32) {
        world.sfx("c");
    }

    fn ran(world: &mut SimulationWorld) -> Vec<String> {
        world
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Sfx(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_systems_run_by_order_then_registration() {
        let mut world = SimulationWorld::new();
        world.add_system("c", mark_c, 5);
        world.add_system("a", mark_a, 0);
        world.add_system("b", mark_b, 5);
        world.run(0.1);
        assert_eq!(ran(&mut world), vec!["a", "c", "b"]);

        world.run_filtered(0.1, |name| name != "c");
        assert_eq!(ran(&mut world), vec!["a", "b"]);

        assert!(world.remove_system("a"));
        assert!(!world.remove_system("a"));
        world.run(0.1);
        assert_eq!(ran(&mut world), vec!["c", "b"]);
    }

    #[test]
    fn test_re_adding_system_keeps_slot() {
        let mut world = SimulationWorld::new();
        world.add_system("x", mark_a, 1);
        world.add_system("y", mark_b, 1);
        world.add_system("x", mark_c, 1);
        assert_eq!(world.system_names(), vec!["x", "y"]);
        world.run(0.1);
        assert_eq!(ran(&mut world), vec!["c", "b"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut world = SimulationWorld::new();
        let first = world.create_entity((Loc::new(0, 0), Solid));
        world.create_entity(Loc::new(1, 0));
        world.add_system("a", mark_a, 0);

        world.reset();

        assert!(world.query::<With<Solid>>().is_empty());
        assert!(world.entities_at(0, 0).is_empty());
        assert!(world.system_names().is_empty());
        let fresh = world.create_entity(Solid);
        assert_eq!(fresh, first);
    }
}
