//! Pure projectile integration with gravity and drag.
//!
//! Every step applies, in this order: drag damping, gravity, then position
//! advance with the updated velocity. Precomputed tables depend on this
//! ordering, and the arena systems in [`crate::systems`] follow it too.

use glam::DVec2;

use ballista_core::constants::{
    DRAG_FACTOR_CLAMP, SIM_MAX_DROP, SIM_MAX_TIME_SECS, SIM_OVERSHOOT_MARGIN,
};
use ballista_core::types::{launch_velocity, TrajectorySample};

/// Inputs for one simulated flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParams {
    pub start: DVec2,
    /// Radians above the horizontal.
    pub angle: f64,
    /// Launch speed (px/s).
    pub speed: f64,
    /// Downward acceleration (px/s²).
    pub gravity: f64,
    /// Fractional velocity decay per second.
    pub drag: f64,
    /// Integration step (seconds).
    pub dt: f64,
    /// Horizontal bound; the flight stops 500 px past it.
    pub bound_x: f64,
}

/// Why a trajectory stopped producing samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryEnd {
    /// Horizontal position passed the bound plus margin.
    PastBound,
    /// Simulated time exceeded the cap.
    TimedOut,
    /// Fell too far below the start height.
    FellBelow,
    /// The time step was zero, negative or not finite.
    InvalidStep,
}

/// A single flight, yielded sample by sample. Not restartable.
#[derive(Debug, Clone)]
pub struct Trajectory {
    params: LaunchParams,
    position: DVec2,
    velocity: DVec2,
    elapsed: f64,
    started: bool,
    end: Option<TrajectoryEnd>,
}

/// Fraction of velocity kept after one drag step.
pub fn drag_retention(drag: f64, dt: f64) -> f64 {
    1.0 - (drag * dt).min(DRAG_FACTOR_CLAMP)
}

/// Start simulating a flight. The first sample is the launch state at t = 0.
pub fn simulate(params: LaunchParams) -> Trajectory {
    Trajectory {
        params,
        position: params.start,
        velocity: launch_velocity(params.angle, params.speed),
        elapsed: 0.0,
        started: false,
        end: None,
    }
}

impl Trajectory {
    /// The limit that ended the flight, once the iterator is exhausted.
    pub fn end(&self) -> Option<TrajectoryEnd> {
        self.end
    }

    /// Consume the flight and return the sample nearest `target` with its distance.
    pub fn closest_approach(self, target: DVec2) -> Option<(TrajectorySample, f64)> {
        self.map(|s| (s, s.distance_to(target)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn step(&mut self) {
        let p = &self.params;
        self.velocity *= drag_retention(p.drag, p.dt);
        self.velocity.y -= p.gravity * p.dt;
        self.position += self.velocity * p.dt;
        self.elapsed += p.dt;
    }

    fn limit_reached(&self) -> Option<TrajectoryEnd> {
        let p = &self.params;
        if self.position.x > p.bound_x + SIM_OVERSHOOT_MARGIN {
            Some(TrajectoryEnd::PastBound)
        } else if self.elapsed > SIM_MAX_TIME_SECS {
            Some(TrajectoryEnd::TimedOut)
        } else if self.position.y < p.start.y - SIM_MAX_DROP {
            Some(TrajectoryEnd::FellBelow)
        } else {
            None
        }
    }
}

impl Iterator for Trajectory {
    type Item = TrajectorySample;

    fn next(&mut self) -> Option<TrajectorySample> {
        if self.end.is_some() {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some(TrajectorySample::new(self.position, self.elapsed));
        }

        if !(self.params.dt.is_finite() && self.params.dt > 0.0) {
            self.end = Some(TrajectoryEnd::InvalidStep);
            return None;
        }

        self.step();

        if let Some(end) = self.limit_reached() {
            self.end = Some(end);
            return None;
        }

        Some(TrajectorySample::new(self.position, self.elapsed))
    }
}
