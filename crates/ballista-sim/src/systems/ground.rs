//! Ground contact: keeps bodies above the ground plane and flags them.

use hecs::{Entity, World};

use crate::physics::components::{Collider, Grounded, Position, Velocity};

/// Push bodies that sank into the ground back onto it, stop their descent,
/// apply rolling friction and tag them `Grounded`.
/// Uses a caller-owned buffer to avoid per-step allocation.
pub fn run(
    world: &mut World,
    ground_y: f64,
    friction: f64,
    dt: f64,
    contact_buffer: &mut Vec<Entity>,
) {
    contact_buffer.clear();
    let retention = 1.0 - (friction * dt).min(1.0);

    for (entity, (pos, vel, collider)) in
        world.query_mut::<(&mut Position, &mut Velocity, &Collider)>()
    {
        if pos.0.y - collider.radius > ground_y {
            continue;
        }
        pos.0.y = ground_y + collider.radius;
        if vel.0.y < 0.0 {
            vel.0.y = 0.0;
        }
        vel.0.x *= retention;
        contact_buffer.push(entity);
    }

    for entity in contact_buffer.drain(..) {
        let _ = world.insert_one(entity, Grounded);
    }
}
