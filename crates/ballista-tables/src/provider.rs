//! Per-shot angle selection: live solving or precomputed table lookup.

use std::sync::Arc;

use glam::DVec2;
use rand::Rng;
use tracing::{debug, warn};

use ballista_core::constants::FALLBACK_ANGLE;
use ballista_core::profile::WorldProfile;
use ballista_core::types::LaunchSolution;
use ballista_sim::solver::{choose, AngleSolver};

use crate::cache::TableCache;

/// How a world obtains launch angles.
pub enum AngleProvider {
    /// Sweep the simulator for every shot.
    LiveSolve { solver: AngleSolver, speed: f64 },
    /// Read the world's firing table, solving live for cells it lacks.
    TableLookup {
        world_id: String,
        cache: Arc<TableCache>,
        fallback: AngleSolver,
        speed: f64,
    },
}

impl AngleProvider {
    /// Live solving at the world's nominal speed.
    pub fn live(world: &WorldProfile) -> Self {
        Self::LiveSolve {
            solver: AngleSolver::new(world),
            speed: world.nominal_speed(),
        }
    }

    /// Table lookup for `world`, with live solving as the fallback.
    pub fn table(world: &WorldProfile, cache: Arc<TableCache>) -> Self {
        Self::TableLookup {
            world_id: world.id.clone(),
            cache,
            fallback: AngleSolver::new(world),
            speed: world.nominal_speed(),
        }
    }

    /// Every known launch angle (radians) that reaches `target`.
    ///
    /// Live solves run on the blocking pool, so this must be called from
    /// within a tokio runtime.
    pub async fn angles(&self, target: DVec2) -> Vec<f64> {
        match self {
            Self::LiveSolve { solver, speed } => solve(solver, target, *speed).await,
            Self::TableLookup {
                world_id,
                cache,
                fallback,
                speed,
            } => {
                let angles = cache.lookup(world_id, target).await;
                if angles.is_empty() {
                    debug!(world = %world_id, x = target.x, y = target.y, "no table entry, solving live");
                    solve(fallback, target, *speed).await
                } else {
                    angles
                }
            }
        }
    }

    /// One launch angle for `target`, picked with `rng` when several reach it.
    /// Falls back to 45 degrees when nothing does.
    pub async fn aim<R: Rng + ?Sized>(&self, target: DVec2, rng: &mut R) -> f64 {
        let solutions: Vec<LaunchSolution> = self
            .angles(target)
            .await
            .into_iter()
            .map(LaunchSolution::new)
            .collect();
        choose(&solutions, rng)
            .map(|solution| solution.angle)
            .unwrap_or(FALLBACK_ANGLE)
    }
}

/// Run the solver sweep off the async workers.
async fn solve(solver: &AngleSolver, target: DVec2, speed: f64) -> Vec<f64> {
    let solver = solver.clone();
    match tokio::task::spawn_blocking(move || solver.solve(target, speed)).await {
        Ok(Ok(solutions)) => solutions.iter().map(|s| s.angle).collect(),
        Ok(Err(error)) => {
            debug!(%error, x = target.x, y = target.y, "live solve found no angle");
            Vec::new()
        }
        Err(error) => {
            warn!(%error, "live solve task failed");
            Vec::new()
        }
    }
}
