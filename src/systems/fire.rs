//! Fire propagation.
//!
//! A `Fire` sets co-located living things alight and heats adjacent
//! flammables. A flammable that gets hot enough turns into a new `Fire`,
//! which is how fire spreads from object to object.

use bevy_ecs::query::With;
use log::debug;

use crate::components::*;
use crate::world::{EntityId, SimulationWorld};

const ADJACENT: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Sprite shared by fires and small fires.
pub fn flame_sprite() -> Sprite {
    Sprite::new('^' as u32, 9, 0).with_depth(15)
}

// ============================================================================
// FIRE SYSTEM
// ============================================================================

/// Burn, heat neighbours, then burn down.
///
/// ## Data Access
/// - Reads: Loc, Health, OnFire
/// - Writes: Fire, Flammable, OnFire, spawns FireSmall
pub fn fire_system(world: &mut SimulationWorld, dt: f32) {
    let heat = world.config().fire_heat_rate * dt;

    for fire in world.query::<With<Fire>>() {
        if let Some(loc) = world.loc(fire) {
            for victim in world.entities_at(loc.col, loc.row) {
                if victim != fire && world.has::<Health>(victim) && !world.has::<OnFire>(victim) {
                    ignite(world, victim);
                }
            }
            for (dx, dy) in ADJACENT {
                let cell = loc.offset(dx, dy);
                for neighbour in world.entities_at(cell.col, cell.row) {
                    if let Some(mut flammable) = world.get_mut::<Flammable>(neighbour) {
                        flammable.temperature += heat;
                    }
                }
            }
        }

        let expired = match world.get_mut::<Fire>(fire) {
            Some(mut f) => {
                f.duration -= dt;
                f.duration <= 0.0
            }
            None => false,
        };
        if expired {
            world.remove_entity(fire);
        }
    }
}

/// Attach a small fire to `target` and mark it `OnFire`.
pub fn ignite(world: &mut SimulationWorld, target: EntityId) -> EntityId {
    let duration = world.config().small_fire_duration;
    world.add(target, OnFire);
    let flame = world.create_entity((
        FireSmall {
            duration,
            parent: target,
        },
        flame_sprite(),
    ));
    if let Some(loc) = world.loc(target) {
        world.add(flame, loc);
    }
    debug!("{target:?} caught fire");
    flame
}

// ============================================================================
// SMALL FIRE SYSTEM
// ============================================================================

/// Follow the burning parent and hurt it until the flame dies out.
pub fn fire_small_system(world: &mut SimulationWorld, dt: f32) {
    let dps = world.config().small_fire_dps;

    for (flame, small) in world.bucket::<FireSmall>() {
        let parent = small.parent;
        if !world.contains(parent) {
            world.remove_entity(flame);
            continue;
        }

        if let Some(at) = world.loc(parent) {
            world.add(flame, at);
        }
        if let Some(mut health) = world.get_mut::<Health>(parent) {
            health.damage(dps * dt);
        }

        let remaining = small.duration - dt;
        if remaining > 0.0 {
            if let Some(mut s) = world.get_mut::<FireSmall>(flame) {
                s.duration = remaining;
            }
            continue;
        }

        world.remove_entity(flame);
        world.remove_component::<OnFire>(parent);
        if let Some(mut health) = world.get_mut::<Health>(parent) {
            health.value = health.value.floor();
        }
        debug!("{parent:?} stopped burning");
    }
}

// ============================================================================
// FLAMMABLE SYSTEM
// ============================================================================

/// Ignite hot flammables, cool the rest.
pub fn flammable_system(world: &mut SimulationWorld, dt: f32) {
    let ignite_at = world.config().ignite_temperature;
    let cooling = world.config().cool_rate * dt;
    let fire_duration = world.config().fire_duration;

    for (id, flammable) in world.bucket::<Flammable>() {
        if flammable.temperature < ignite_at {
            if let Some(mut f) = world.get_mut::<Flammable>(id) {
                f.temperature = (f.temperature - cooling).max(0.0);
            }
            continue;
        }

        let at = world.loc(id);
        world.remove_entity(id);
        if let Some(at) = at {
            world.create_entity((at, Fire { duration: fire_duration }, flame_sprite()));
            world.sfx("fire");
            debug!("{id:?} burst into flames at ({}, {})", at.col, at.row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_burns_down() {
        let mut world = SimulationWorld::new();
        let fire = world.create_entity((Loc::new(0, 0), Fire { duration: 0.5 }));
        fire_system(&mut world, 0.25);
        assert!(world.contains(fire));
        fire_system(&mut world, 0.25);
        assert!(!world.contains(fire));
        assert!(world.entities_at(0, 0).is_empty());
    }

    #[test]
    fn test_fire_ignites_colocated_health_once() {
        let mut world = SimulationWorld::new();
        world.create_entity((Loc::new(1, 1), Fire { duration: 5.0 }));
        world.create_entity((Loc::new(1, 1), Fire { duration: 5.0 }));
        let victim = world.create_entity((Loc::new(1, 1), Health::new(10.0)));
        let rock = world.create_entity(Loc::new(1, 1));

        fire_system(&mut world, 0.1);
        fire_system(&mut world, 0.1);

        assert!(world.has::<OnFire>(victim));
        assert!(!world.has::<OnFire>(rock));
        let flames = world.bucket::<FireSmall>();
        assert_eq!(flames.len(), 1);
        assert_eq!(flames[0].1.parent, victim);
    }

    #[test]
    fn test_fire_heats_only_adjacent_flammables() {
        let mut world = SimulationWorld::new();
        world.create_entity((Loc::new(2, 2), Fire { duration: 5.0 }));
        let near = world.create_entity((Loc::new(2, 1), Flammable::default()));
        let diagonal = world.create_entity((Loc::new(3, 3), Flammable::default()));

        fire_system(&mut world, 0.2);

        let rate = world.config().fire_heat_rate;
        assert!((world.get::<Flammable>(near).unwrap().temperature - rate * 0.2).abs() < 1e-4);
        assert_eq!(world.get::<Flammable>(diagonal).unwrap().temperature, 0.0);
    }

    #[test]
    fn test_small_fire_follows_damages_and_floors() {
        let mut world = SimulationWorld::new();
        world.config_mut().small_fire_duration = 1.0;
        world.config_mut().small_fire_dps = 1.5;
        let victim = world.create_entity((Loc::new(0, 0), Health::new(10.0)));
        let flame = ignite(&mut world, victim);

        world.set_loc(victim, 3, 0);
        fire_small_system(&mut world, 0.5);
        assert_eq!(world.loc(flame), Some(Loc::new(3, 0)));
        assert!((world.get::<Health>(victim).unwrap().value - 9.25).abs() < 1e-4);

        fire_small_system(&mut world, 0.5);
        assert!(!world.contains(flame));
        assert!(!world.has::<OnFire>(victim));
        assert_eq!(world.get::<Health>(victim).unwrap().value, 8.0);
    }

    #[test]
    fn test_small_fire_without_parent_goes_out() {
        let mut world = SimulationWorld::new();
        let victim = world.create_entity((Loc::new(0, 0), Health::new(10.0)));
        let flame = ignite(&mut world, victim);
        world.remove_entity(victim);
        fire_small_system(&mut world, 0.1);
        assert!(!world.contains(flame));
    }

    #[test]
    fn test_flammable_cools_and_clamps() {
        let mut world = SimulationWorld::new();
        let barrel = world.create_entity((Loc::new(0, 0), Flammable { temperature: 1.0 }));
        flammable_system(&mut world, 1.0);
        assert_eq!(world.get::<Flammable>(barrel).unwrap().temperature, 0.0);
        assert!(world.query::<With<Fire>>().is_empty());
    }

    #[test]
    fn test_flammable_ignites_exactly_once_at_threshold() {
        let mut world = SimulationWorld::new();
        let threshold = world.config().ignite_temperature;
        let hot = world.create_entity((Loc::new(4, 4), Flammable { temperature: threshold }));
        let warm = world.create_entity((Loc::new(5, 4), Flammable { temperature: threshold - 0.01 }));

        flammable_system(&mut world, 0.1);
        flammable_system(&mut world, 0.1);

        assert!(!world.contains(hot));
        assert!(world.contains(warm));
        let fires = world.query::<With<Fire>>();
        assert_eq!(fires.len(), 1);
        assert_eq!(world.loc(fires[0]), Some(Loc::new(4, 4)));
    }
}
