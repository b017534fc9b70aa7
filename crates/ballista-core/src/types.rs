//! Fundamental geometric and trajectory types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// One point along a simulated or real flight path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Position in world pixels (y-up).
    pub position: DVec2,
    /// Seconds since launch.
    pub elapsed: f64,
}

/// A launch angle judged to hit its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchSolution {
    /// Angle above the horizontal, in radians.
    pub angle: f64,
}

impl TrajectorySample {
    pub fn new(position: DVec2, elapsed: f64) -> Self {
        Self { position, elapsed }
    }

    pub fn distance_to(&self, point: DVec2) -> f64 {
        self.position.distance(point)
    }
}

impl LaunchSolution {
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }

    pub fn degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Unit vector along the barrel.
    pub fn direction(&self) -> DVec2 {
        direction(self.angle)
    }
}

/// Unit vector for an angle measured counter-clockwise from +x.
pub fn direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Initial velocity for a projectile launched at `angle` with `speed`.
pub fn launch_velocity(angle: f64, speed: f64) -> DVec2 {
    direction(angle) * speed
}
