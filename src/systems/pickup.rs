//! Collecting pickups.

use bevy_ecs::query::With;
use log::debug;

use crate::components::*;
use crate::events::SimEvent;
use crate::world::SimulationWorld;

/// The player collects pickups it stands on; looting AIs carry them off.
///
/// Collection bumps the inventory count for the pickup's kind and merges
/// its attributes into the inventory flags. A consumed pickup is removed;
/// a non-consumed one stays on the map but cannot be collected again.
pub fn pickup_system(world: &mut SimulationWorld, _dt: f32) {
    for item in world.query::<(With<Pickup>, With<Loc>)>() {
        let (Some(at), Some(pickup)) = (world.loc(item), world.get::<Pickup>(item).cloned()) else {
            continue;
        };
        let here = world.entities_at(at.col, at.row);

        if let Some(player) = here.iter().copied().find(|e| world.has::<Player>(*e)) {
            let inventory = world.inventory_mut();
            inventory.add(&pickup.kind);
            inventory.merge_flags(&pickup.atts);
            if pickup.consume {
                world.remove_entity(item);
            } else {
                world.remove_component::<Pickup>(item);
            }
            world.emit(SimEvent::PickedUp { by: player, kind: pickup.kind.clone() });
            world.sfx("pickup");
            debug!("{player:?} picked up {}", pickup.kind);
            continue;
        }

        let looter = here
            .iter()
            .copied()
            .find(|e| world.get::<Ai>(*e).is_some_and(|ai| ai.loots));
        if let Some(looter) = looter {
            world.remove_entity(item);
            debug!("{looter:?} looted {}", pickup.kind);
        }
    }
}
