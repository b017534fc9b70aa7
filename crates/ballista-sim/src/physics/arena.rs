//! Headless physics arena backed by a hecs world.
//!
//! Integrates projectiles with the same drag → gravity → movement order as
//! the trajectory simulator, then resolves contact with a flat ground plane.

use hecs::{Entity, World};

use ballista_core::constants::GROUND_Y;
use ballista_core::profile::WorldProfile;

use super::components::{Collider, Grounded, Position, Projectile, Velocity};
use super::{BodyHandle, BodyState, PhysicsEngine, ShotSpec};
use crate::systems;

/// Physical constants for an arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    /// Downward acceleration (px/s²).
    pub gravity: f64,
    /// Fractional velocity decay per second.
    pub drag: f64,
    /// Height of the ground plane (pixels).
    pub ground_y: f64,
    /// Fractional horizontal decay per second while on the ground.
    pub ground_friction: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            gravity: 900.0,
            drag: 0.01,
            ground_y: GROUND_Y,
            ground_friction: 4.0,
        }
    }
}

impl ArenaConfig {
    /// Arena matching a world's gravity and drag.
    pub fn for_profile(profile: &WorldProfile) -> Self {
        Self {
            gravity: profile.gravity,
            drag: profile.drag,
            ..Self::default()
        }
    }
}

/// The arena. Owns the ECS world and all body state.
pub struct ArenaPhysics {
    world: World,
    config: ArenaConfig,
    contact_buffer: Vec<Entity>,
}

impl ArenaPhysics {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            world: World::new(),
            config,
            contact_buffer: Vec::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Read-only access to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    fn entity(handle: BodyHandle) -> Option<Entity> {
        Entity::from_bits(handle.0)
    }

    fn handle(entity: Entity) -> BodyHandle {
        BodyHandle(entity.to_bits().get())
    }
}

impl PhysicsEngine for ArenaPhysics {
    fn fire(&mut self, shot: ShotSpec) -> Option<BodyHandle> {
        let entity = self.world.spawn((
            Projectile,
            Position(shot.position),
            Velocity(shot.velocity),
            Collider {
                radius: shot.radius,
            },
        ));
        Some(Self::handle(entity))
    }

    fn step(&mut self, dt: f64) {
        // 1. Drag
        systems::drag::run(&mut self.world, self.config.drag, dt);
        // 2. Gravity
        systems::gravity::run(&mut self.world, self.config.gravity, dt);
        // 3. Movement integration
        systems::movement::run(&mut self.world, dt);
        // 4. Ground contact
        systems::ground::run(
            &mut self.world,
            self.config.ground_y,
            self.config.ground_friction,
            dt,
            &mut self.contact_buffer,
        );
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        let entity = Self::entity(handle)?;
        let position = self.world.get::<&Position>(entity).ok()?.0;
        let velocity = self.world.get::<&Velocity>(entity).ok()?.0;
        let radius = self.world.get::<&Collider>(entity).ok()?.radius;
        let grounded = self.world.get::<&Grounded>(entity).is_ok();
        Some(BodyState {
            position,
            velocity,
            radius,
            grounded,
        })
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        match Self::entity(handle) {
            Some(entity) => self.world.despawn(entity).is_ok(),
            None => false,
        }
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        let mut query = self.world.query::<&Projectile>();
        query.iter().map(|(entity, _)| Self::handle(entity)).collect()
    }
}
