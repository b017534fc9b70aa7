//! Kinematic integration: position += velocity * dt.

use hecs::World;

use crate::physics::components::{Position, Velocity};

pub fn run(world: &mut World, dt: f64) {
    for (_entity, (pos, vel)) in world.query_mut::<(&mut Position, &Velocity)>() {
        pos.0 += vel.0 * dt;
    }
}
