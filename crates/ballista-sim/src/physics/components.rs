//! ECS components for arena bodies.
//!
//! Components are plain data. Behaviour lives in [`crate::systems`].

use glam::DVec2;

/// Marks an entity as a fired projectile.
#[derive(Debug, Clone, Copy)]
pub struct Projectile;

/// World position (pixels, y-up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub DVec2);

/// Velocity (px/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub DVec2);

/// Bounding circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f64,
}

/// Added once a body touches the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct Grounded;
