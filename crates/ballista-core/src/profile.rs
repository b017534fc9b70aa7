//! World profiles: the physical constants of one game world.
//!
//! All values are in canonical per-second units. Profiles authored against a
//! frame-stepped engine go through [`WorldProfile::from_frame_scaled`] once,
//! at load time, and never reach the simulator in per-frame form.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::PROJECTILE_RADIUS;
use crate::error::BallisticsError;
use crate::types::direction;

/// Range of launch speeds a world's upgrades can reach (px/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

/// Cannon placement and barrel length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrelGeometry {
    /// Pivot the barrel rotates around (world pixels, y-up).
    pub pivot: DVec2,
    /// Distance from pivot to muzzle (pixels).
    pub length: f64,
}

/// Immutable physical description of one game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldProfile {
    /// Identifier selecting this world's firing table.
    pub id: String,
    /// Downward acceleration (px/s²).
    pub gravity: f64,
    /// Fractional velocity decay per second.
    pub drag: f64,
    pub speed_range: SpeedRange,
    pub barrel: BarrelGeometry,
    #[serde(default = "default_projectile_radius")]
    pub projectile_radius: f64,
}

/// A profile expressed in per-frame units, as frame-stepped engines store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameScaledProfile {
    pub id: String,
    /// Downward acceleration (px/frame²).
    pub gravity_per_frame: f64,
    /// Fractional velocity decay per frame.
    pub drag_per_frame: f64,
    /// Launch speeds (px/frame).
    pub speed_range_per_frame: SpeedRange,
    pub barrel: BarrelGeometry,
    #[serde(default = "default_projectile_radius")]
    pub projectile_radius: f64,
}

fn default_projectile_radius() -> f64 {
    PROJECTILE_RADIUS
}

impl WorldProfile {
    /// Convert a per-frame profile at `frame_rate` Hz into per-second units.
    pub fn from_frame_scaled(frame: &FrameScaledProfile, frame_rate: f64) -> Self {
        Self {
            id: frame.id.clone(),
            gravity: frame.gravity_per_frame * frame_rate * frame_rate,
            drag: frame.drag_per_frame * frame_rate,
            speed_range: SpeedRange {
                min: frame.speed_range_per_frame.min * frame_rate,
                max: frame.speed_range_per_frame.max * frame_rate,
            },
            barrel: frame.barrel,
            projectile_radius: frame.projectile_radius,
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, BallisticsError> {
        let profile: WorldProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject profiles the simulator cannot integrate meaningfully.
    pub fn validate(&self) -> Result<(), BallisticsError> {
        if self.id.trim().is_empty() {
            return Err(BallisticsError::InvalidProfile("empty world id".into()));
        }
        if !self.gravity.is_finite() || self.gravity <= 0.0 {
            return Err(BallisticsError::InvalidProfile(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        if !self.drag.is_finite() || self.drag < 0.0 {
            return Err(BallisticsError::InvalidProfile(format!(
                "drag must be non-negative, got {}",
                self.drag
            )));
        }
        let SpeedRange { min, max } = self.speed_range;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            return Err(BallisticsError::InvalidProfile(format!(
                "speed range {min}..{max} is not a positive interval"
            )));
        }
        if !self.barrel.length.is_finite() || self.barrel.length < 0.0 {
            return Err(BallisticsError::InvalidProfile(format!(
                "barrel length must be non-negative, got {}",
                self.barrel.length
            )));
        }
        if !self.projectile_radius.is_finite() || self.projectile_radius <= 0.0 {
            return Err(BallisticsError::InvalidProfile(format!(
                "projectile radius must be positive, got {}",
                self.projectile_radius
            )));
        }
        Ok(())
    }

    /// The speed firing tables for this world are built at.
    pub fn nominal_speed(&self) -> f64 {
        self.speed_range.max
    }

    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.clamp(self.speed_range.min, self.speed_range.max)
    }

    /// Where a projectile leaves the barrel when fired at `angle` radians.
    pub fn muzzle(&self, angle: f64) -> DVec2 {
        self.barrel.pivot + direction(angle) * self.barrel.length
    }
}
