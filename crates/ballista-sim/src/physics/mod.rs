//! The physics-engine port the table builder drives, and a headless
//! implementation of it.
//!
//! The host game owns its own engine; it only needs to implement
//! [`PhysicsEngine`] for the builder to run against it.

mod arena;
pub mod components;

use glam::DVec2;

pub use arena::{ArenaConfig, ArenaPhysics};

/// Opaque handle to a body owned by a physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// A projectile to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
}

/// Observed state of a live body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Bounding-circle radius (pixels).
    pub radius: f64,
    /// Whether the body has touched the ground plane.
    pub grounded: bool,
}

impl BodyState {
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// Operations the firing-table builder needs from a physics engine.
pub trait PhysicsEngine {
    /// Create a projectile and return a handle to exactly that body.
    /// `None` when the engine could not create it.
    fn fire(&mut self, shot: ShotSpec) -> Option<BodyHandle>;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f64);

    /// Current state of a body, or `None` if it is not (or no longer) live.
    fn body(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Remove a body. Returns false if it was already gone.
    fn remove(&mut self, handle: BodyHandle) -> bool;

    /// Every live body.
    fn bodies(&self) -> Vec<BodyHandle>;
}
