use hecs::World;

use crate::physics::components::{Projectile, Velocity};

/// Apply gravitational acceleration to all projectiles.
/// Positive y is up, so gravity subtracts from the vertical velocity.
pub fn run(world: &mut World, gravity: f64, dt: f64) {
    for (_entity, (vel, _projectile)) in world.query_mut::<(&mut Velocity, &Projectile)>() {
        vel.0.y -= gravity * dt;
    }
}
