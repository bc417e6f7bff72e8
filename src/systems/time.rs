//! Shell clock.
use bevy_ecs::prelude::*;
use log::trace;

use crate::resources::worldtime::WorldTime;

/// Advance [`WorldTime`] by one tick of `dt` seconds.
pub fn update_world_time(world: &mut World, dt: f32) {
    let tick = world.resource_mut::<WorldTime>().advance(dt);
    trace!("tick {} ({:.3}s)", tick, dt);
}
