//! Velocity damping.

use hecs::World;

use crate::physics::components::{Projectile, Velocity};
use crate::trajectory::drag_retention;

/// Damp every projectile's velocity by `1 - min(drag * dt, 0.99)`.
pub fn run(world: &mut World, drag: f64, dt: f64) {
    let retention = drag_retention(drag, dt);
    for (_entity, (vel, _projectile)) in world.query_mut::<(&mut Velocity, &Projectile)>() {
        vel.0 *= retention;
    }
}
