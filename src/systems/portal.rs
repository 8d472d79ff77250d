//! Portals: stepping onto one moves the mover to its named partner.

use log::{debug, warn};

use crate::components::*;
use crate::events::SimEvent;
use crate::world::{EntityId, SimulationWorld};

const LANDING_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Teleport `mover` if it stands on a portal. Returns the landing cell.
///
/// The mover lands on the destination portal's cell, or on the first free
/// neighbour (left, right, up, down) when that cell is blocked. A portal
/// whose target names no other portal is logged and ignored.
pub fn enter_portal(world: &mut SimulationWorld, mover: EntityId) -> Option<Loc> {
    let here = world.loc(mover)?;
    let source = world
        .entities_at(here.col, here.row)
        .into_iter()
        .find(|e| *e != mover && world.has::<Portal>(*e))?;
    let target = world.get::<Portal>(source)?.target.clone();
    if target.is_empty() {
        return None;
    }

    let destination = world
        .bucket::<Portal>()
        .into_iter()
        .find(|(id, portal)| *id != source && portal.name.as_deref() == Some(target.as_str()))
        .and_then(|(id, _)| world.loc(id));
    let Some(destination) = destination else {
        warn!("portal {source:?} targets unknown portal '{target}'");
        return None;
    };

    let can_land = |loc: Loc| world.is_walkable(loc.col, loc.row) && !world.is_solid_at_except(loc.col, loc.row, mover);
    let landing = std::iter::once(destination)
        .chain(LANDING_OFFSETS.iter().map(|&(dx, dy)| destination.offset(dx, dy)))
        .find(|loc| can_land(*loc))?;

    world.set_loc(mover, landing.col, landing.row);
    world.sfx("teleport");
    world.emit(SimEvent::Teleported { entity: mover, to: landing });
    debug!("{mover:?} teleported to ({}, {}) via '{target}'", landing.col, landing.row);
    Some(landing)
}
