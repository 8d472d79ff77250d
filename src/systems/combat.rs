//! Bump attacks: walking into a hostile deals the attacker's damage.

use log::debug;

use crate::components::*;
use crate::world::{EntityId, SimulationWorld};

/// Player and non-player entities are hostile to each other.
pub fn are_hostile(world: &SimulationWorld, a: EntityId, b: EntityId) -> bool {
    a != b && world.has::<Player>(a) != world.has::<Player>(b)
}

/// `attacker` hits `target` for its `Attack` value.
///
/// Returns false (and does nothing) if the attacker has no `Attack`, the
/// target is not an `AttackTarget` with `Health`, or the target is still
/// inside its post-hit cooldown.
pub fn bump_attack(world: &mut SimulationWorld, attacker: EntityId, target: EntityId) -> bool {
    let Some(damage) = world.get::<Attack>(attacker).map(|a| a.value) else {
        return false;
    };
    if !world.has::<AttackTarget>(target) {
        return false;
    }
    let cooldown = world.config().hit_cooldown;
    let remaining = {
        let Some(mut health) = world.get_mut::<Health>(target) else {
            return false;
        };
        if health.cooldown_timer > 0.0 {
            return false;
        }
        health.damage(damage);
        health.cooldown_timer = cooldown;
        health.value
    };
    world.sfx("hit");
    debug!("{attacker:?} hit {target:?} for {damage} ({remaining} left)");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_applies_damage_and_cooldown() {
        let mut world = SimulationWorld::new();
        let guard = world.create_entity((Loc::new(0, 0), Attack { value: 2.0 }));
        let player = world.create_entity((Loc::new(1, 0), Player, Health::new(10.0), AttackTarget));

        assert!(bump_attack(&mut world, guard, player));
        let health = world.get::<Health>(player).unwrap();
        assert_eq!(health.value, 8.0);
        assert_eq!(health.cooldown_timer, world.config().hit_cooldown);

        // Still cooling down.
        assert!(!bump_attack(&mut world, guard, player));
        assert_eq!(world.get::<Health>(player).unwrap().value, 8.0);
    }

    #[test]
    fn test_requires_attack_and_target() {
        let mut world = SimulationWorld::new();
        let unarmed = world.create_entity(Loc::new(0, 0));
        let armed = world.create_entity(Attack { value: 1.0 });
        let wall = world.create_entity(Health::new(5.0));
        let dummy = world.create_entity((Health::new(5.0), AttackTarget));

        assert!(!bump_attack(&mut world, unarmed, dummy));
        assert!(!bump_attack(&mut world, armed, wall));
        assert!(bump_attack(&mut world, armed, dummy));
    }

    #[test]
    fn test_hostility() {
        let mut world = SimulationWorld::new();
        let player = world.create_entity(Player);
        let a = world.create_entity(Solid);
        let b = world.create_entity(Solid);
        assert!(are_hostile(&world, player, a));
        assert!(are_hostile(&world, a, player));
        assert!(!are_hostile(&world, a, b));
        assert!(!are_hostile(&world, player, player));
    }
}
