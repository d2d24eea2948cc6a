//! Per-step systems.
//!
//! Each system walks a view and mutates the world in place. Entities found
//! to be expired are queued in an [`EntityBuffer`] and destroyed once the
//! walk is over.

use anyhow::Result;
use engine_ecs::{EntityBuffer, ViewCursor, World};
use tracing::debug;

use crate::components::{Lifetime, Position, Velocity};

/// Move every entity with a velocity. Returns the number moved.
pub fn integrate(world: &mut World, dt: f32) -> Result<usize> {
    let mut moved = 0;
    let mut view = world.view::<(Position, Velocity)>()?;
    while view.valid() {
        let velocity = *view.get::<Velocity>(world)?;
        view.get_mut::<Position>(world)?.0 += velocity.0 * dt;
        moved += 1;
        view.advance(world);
    }
    Ok(moved)
}

/// Count every lifetime down and queue the expired entities.
pub fn age(world: &mut World, dt: f32, expired: &mut EntityBuffer) -> Result<()> {
    let mut view = world.single_view::<Lifetime>()?;
    while view.valid() {
        if view.get_mut::<Lifetime>(world)?.tick(dt) {
            expired.push(view.entity());
        }
        view.advance(world);
    }
    Ok(())
}

/// Run one simulation step. Returns the number of entities destroyed.
pub fn step(world: &mut World, dt: f32, expired: &mut EntityBuffer) -> Result<usize> {
    let moved = integrate(world, dt)?;
    age(world, dt, expired)?;
    let destroyed = expired.flush(world);
    debug!(moved, destroyed, "step complete");
    Ok(destroyed)
}
