//! Live angle solver: sweeps candidate launch angles through the trajectory
//! simulator and keeps those whose flight passes close to the target.
//!
//! Used synchronously per shot, so the sweep range, angular step and time
//! step together cap the work at a fixed number of integration steps.

use glam::DVec2;
use rand::Rng;
use tracing::debug;

use ballista_core::constants::*;
use ballista_core::error::BallisticsError;
use ballista_core::profile::{BarrelGeometry, WorldProfile};
use ballista_core::types::{direction, LaunchSolution};

use crate::trajectory::{simulate, LaunchParams};

/// Sweep and tolerance settings for the live solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub sweep_start_deg: f64,
    pub sweep_end_deg: f64,
    pub sweep_step_deg: f64,
    /// Maximum sample-to-target distance that counts as a hit (pixels).
    pub hit_tolerance: f64,
    /// Integration step (seconds).
    pub dt: f64,
    /// Hits closer than this collapse into one solution (radians).
    pub duplicate_window: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sweep_start_deg: SOLVER_SWEEP_START_DEG,
            sweep_end_deg: SOLVER_SWEEP_END_DEG,
            sweep_step_deg: SOLVER_SWEEP_STEP_DEG,
            hit_tolerance: HIT_TOLERANCE,
            dt: DT,
            duplicate_window: DUPLICATE_ANGLE_WINDOW,
        }
    }
}

/// Per-world live solver.
#[derive(Debug, Clone)]
pub struct AngleSolver {
    gravity: f64,
    drag: f64,
    barrel: BarrelGeometry,
    config: SolverConfig,
}

impl AngleSolver {
    pub fn new(profile: &WorldProfile) -> Self {
        Self::with_config(profile, SolverConfig::default())
    }

    pub fn with_config(profile: &WorldProfile, config: SolverConfig) -> Self {
        Self {
            gravity: profile.gravity,
            drag: profile.drag,
            barrel: profile.barrel,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The launch point targets are judged against.
    pub fn origin(&self) -> DVec2 {
        self.barrel.pivot
    }

    /// Candidate angles in sweep order (radians).
    pub fn candidates(&self) -> impl Iterator<Item = f64> {
        let SolverConfig {
            sweep_start_deg: start,
            sweep_end_deg: end,
            sweep_step_deg: step,
            ..
        } = self.config;
        let count = if step > 0.0 && end >= start {
            ((end - start) / step).round() as usize + 1
        } else {
            0
        };
        (0..count).map(move |i| (start + i as f64 * step).to_radians())
    }

    /// Launch parameters for a shot at `angle` toward `target`.
    pub fn launch_params(&self, angle: f64, target: DVec2, speed: f64) -> LaunchParams {
        LaunchParams {
            start: self.barrel.pivot + direction(angle) * self.barrel.length,
            angle,
            speed,
            gravity: self.gravity,
            drag: self.drag,
            dt: self.config.dt,
            bound_x: target.x,
        }
    }

    /// Whether a shot at `angle` passes within tolerance of `target`.
    pub fn hits(&self, angle: f64, target: DVec2, speed: f64) -> bool {
        let tolerance = self.config.hit_tolerance;
        simulate(self.launch_params(angle, target, speed))
            .any(|sample| sample.distance_to(target) <= tolerance)
    }

    /// Find the distinct launch angles that hit `target` at `speed`.
    pub fn solve(&self, target: DVec2, speed: f64) -> Result<Vec<LaunchSolution>, BallisticsError> {
        if target.x <= self.origin().x {
            return Err(BallisticsError::TargetUnreachable {
                reason: "target is not ahead of the launch point",
            });
        }

        let hits: Vec<f64> = self
            .candidates()
            .filter(|&angle| self.hits(angle, target, speed))
            .collect();
        let solutions = dedupe(&hits, self.config.duplicate_window);

        debug!(
            target_x = target.x,
            target_y = target.y,
            raw_hits = hits.len(),
            solutions = solutions.len(),
            "solved launch angles"
        );

        if solutions.is_empty() {
            return Err(BallisticsError::TargetUnreachable {
                reason: "no swept angle reaches the target",
            });
        }
        Ok(solutions)
    }
}

/// Collapse runs of hit angles into one solution each.
///
/// An angle within `window` of the previous hit belongs to that hit's run;
/// each run keeps the first angle found. Angles must be in sweep order.
pub fn dedupe(angles: &[f64], window: f64) -> Vec<LaunchSolution> {
    let mut solutions = Vec::new();
    let mut previous: Option<f64> = None;
    for &angle in angles {
        match previous {
            Some(prev) if (angle - prev).abs() <= window => {}
            _ => solutions.push(LaunchSolution::new(angle)),
        }
        previous = Some(angle);
    }
    solutions
}

/// Pick one solution with the caller's random source.
pub fn choose<R: Rng + ?Sized>(solutions: &[LaunchSolution], rng: &mut R) -> Option<LaunchSolution> {
    if solutions.is_empty() {
        return None;
    }
    Some(solutions[rng.gen_range(0..solutions.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballista_core::profile::SpeedRange;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn profile_at_origin() -> WorldProfile {
        WorldProfile {
            id: "test".into(),
            gravity: 900.0,
            drag: 0.01,
            speed_range: SpeedRange {
                min: 300.0,
                max: 600.0,
            },
            barrel: BarrelGeometry {
                pivot: DVec2::ZERO,
                length: 0.0,
            },
            projectile_radius: PROJECTILE_RADIUS,
        }
    }

    #[test]
    fn test_candidate_sweep_covers_arc() {
        let solver = AngleSolver::new(&profile_at_origin());
        let candidates: Vec<f64> = solver.candidates().collect();
        assert_eq!(candidates.len(), 1901);
        assert!((candidates[0] - (-5.0f64).to_radians()).abs() < 1e-12);
        assert!((candidates[1900] - 185.0f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_dedupe_collapses_runs_keeping_first() {
        let step = 0.1f64.to_radians();
        let run_a: Vec<f64> = (0..30).map(|i| 0.4 + i as f64 * step).collect();
        let run_b: Vec<f64> = (0..10).map(|i| 1.0 + i as f64 * step).collect();
        let all: Vec<f64> = run_a.iter().chain(run_b.iter()).copied().collect();

        let solutions = dedupe(&all, DUPLICATE_ANGLE_WINDOW);
        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[0].angle, 0.4);
        assert_eq!(solutions[1].angle, 1.0);
    }

    #[test]
    fn test_dedupe_keeps_separated_angles() {
        let solutions = dedupe(&[0.1, 0.2, 0.3], DUPLICATE_ANGLE_WINDOW);
        assert_eq!(solutions.len(), 3);
        assert!(dedupe(&[], DUPLICATE_ANGLE_WINDOW).is_empty());
    }

    #[test]
    fn test_choose_is_reproducible_with_seed() {
        let solutions = vec![
            LaunchSolution::new(0.3),
            LaunchSolution::new(0.9),
            LaunchSolution::new(1.2),
        ];
        let picks_a: Vec<f64> = {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..20)
                .map(|_| choose(&solutions, &mut rng).unwrap().angle)
                .collect()
        };
        let picks_b: Vec<f64> = {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..20)
                .map(|_| choose(&solutions, &mut rng).unwrap().angle)
                .collect()
        };
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|a| [0.3, 0.9, 1.2].contains(a)));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(choose(&[], &mut rng).is_none());
    }
}
