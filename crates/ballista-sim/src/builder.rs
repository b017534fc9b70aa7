//! Firing-table builder.
//!
//! Drives a live [`PhysicsEngine`] through a full 0°..359° sweep for one
//! world, recording which probe cells each angle's projectile passes over
//! while it is still fast enough to do damage.
//!
//! The builder is polled once per frame by an external driver and performs
//! at most one state transition per [`TableBuilder::tick`]. Waiting is
//! cooperative: nothing blocks, and every angle is bounded by the settle
//! timeout.

use tracing::{debug, info, warn};

use ballista_core::constants::*;
use ballista_core::error::BallisticsError;
use ballista_core::grid::GridCell;
use ballista_core::profile::WorldProfile;
use ballista_core::table::FiringTable;
use ballista_core::types::launch_velocity;

use crate::physics::{BodyHandle, PhysicsEngine, ShotSpec};
use crate::probe::ProbeGrid;

/// Slack for accumulated floating-point error in per-angle wait time.
const WAIT_EPSILON: f64 = 1e-9;

/// Field size and settle rules for a build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderConfig {
    /// Play field width covered by probes (pixels).
    pub field_width: f64,
    /// Play field height covered by probes (pixels).
    pub field_height: f64,
    /// Slowest a projectile may move and still mark probes (px/s).
    pub min_damage_speed: f64,
    /// Speed below which a projectile is settled (px/s).
    pub settle_speed: f64,
    /// Distance below the field at which a projectile is off-screen (pixels).
    pub offscreen_margin: f64,
    /// Longest wait for one angle (seconds).
    pub settle_timeout_secs: f64,
    /// Delay before re-locating a missing projectile (seconds).
    pub retry_delay_secs: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            min_damage_speed: MIN_DAMAGE_SPEED,
            settle_speed: SETTLE_SPEED,
            offscreen_margin: OFFSCREEN_MARGIN,
            settle_timeout_secs: SETTLE_TIMEOUT_SECS,
            retry_delay_secs: RETRY_DELAY_SECS,
        }
    }
}

/// Why an angle's flight was considered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    Stopped,
    OffScreen,
    Grounded,
    TimedOut,
    /// The engine removed the body on its own.
    Vanished,
}

/// Builder state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuildPhase {
    Idle,
    /// Fire a projectile at exactly `angle` degrees.
    TestingAngle { angle: u16 },
    /// The fired projectile was not located; wait briefly and try once more.
    RetryingFire {
        angle: u16,
        handle: Option<BodyHandle>,
        waited: f64,
    },
    /// Track the projectile until it settles.
    WaitingForSettle {
        angle: u16,
        handle: BodyHandle,
        elapsed: f64,
    },
    /// Attribute flagged probes to `angle` and remove the body.
    RecordHits {
        angle: u16,
        handle: Option<BodyHandle>,
        reason: SettleReason,
    },
    Finished,
}

/// Sweep position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildProgress {
    pub angle: Option<u16>,
    /// 0.0 at start, 1.0 when finished.
    pub fraction: f64,
}

/// Result of a completed build, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub world_id: String,
    pub table: FiringTable,
    /// Angles skipped because the engine never reported their projectile.
    pub skipped_angles: Vec<u16>,
    /// Longest any single angle waited to settle (seconds).
    pub longest_wait_secs: f64,
}

/// Mutable state of one build run. Dropped on abort.
struct BuildRun {
    world_id: String,
    profile: WorldProfile,
    speed: f64,
    table: FiringTable,
    probes: ProbeGrid,
    skipped: Vec<u16>,
    longest_wait_secs: f64,
}

impl BuildRun {
    fn shot(&self, angle: u16) -> ShotSpec {
        let radians = f64::from(angle).to_radians();
        ShotSpec {
            position: self.profile.muzzle(radians),
            velocity: launch_velocity(radians, self.speed),
            radius: self.profile.projectile_radius,
        }
    }
}

/// Builds one world's firing table at a time.
pub struct TableBuilder {
    config: BuilderConfig,
    phase: BuildPhase,
    run: Option<BuildRun>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl TableBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            phase: BuildPhase::Idle,
            run: None,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, BuildPhase::Idle | BuildPhase::Finished)
    }

    /// Angles skipped so far in the current run.
    pub fn skipped_angles(&self) -> &[u16] {
        self.run.as_ref().map(|r| r.skipped.as_slice()).unwrap_or(&[])
    }

    pub fn progress(&self) -> BuildProgress {
        let angle = match self.phase {
            BuildPhase::TestingAngle { angle }
            | BuildPhase::RetryingFire { angle, .. }
            | BuildPhase::WaitingForSettle { angle, .. }
            | BuildPhase::RecordHits { angle, .. } => Some(angle),
            BuildPhase::Idle | BuildPhase::Finished => None,
        };
        let total = f64::from(TABLE_SWEEP_LAST_DEG) + 1.0;
        let fraction = match (self.phase, angle) {
            (BuildPhase::Finished, _) => 1.0,
            (_, Some(angle)) => f64::from(angle) / total,
            _ => 0.0,
        };
        BuildProgress { angle, fraction }
    }

    /// Begin a fresh build for `world` at angle 0. Any run in progress is
    /// aborted first.
    pub fn start<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E, world: &WorldProfile) {
        if self.run.is_some() {
            self.abort(engine);
        }

        let probes = ProbeGrid::new(self.config.field_width, self.config.field_height);
        let mut table = FiringTable::new();
        for point in probes.points() {
            table.ensure_cell(GridCell::containing(point));
        }

        info!(
            world = %world.id,
            probes = probes.len(),
            speed = world.nominal_speed(),
            "starting firing-table build"
        );

        self.run = Some(BuildRun {
            world_id: world.id.clone(),
            profile: world.clone(),
            speed: world.nominal_speed(),
            table,
            probes,
            skipped: Vec::new(),
            longest_wait_secs: 0.0,
        });
        self.phase = BuildPhase::TestingAngle { angle: 0 };
    }

    /// Advance by one frame of `dt` seconds. The caller steps the engine.
    /// A `dt` that is not a positive finite step leaves the phase unchanged.
    pub fn tick<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E, dt: f64) -> BuildPhase {
        if !(dt.is_finite() && dt > 0.0) {
            return self.phase;
        }
        let Self { config, phase, run } = self;
        let Some(run) = run.as_mut() else {
            return *phase;
        };

        *phase = match *phase {
            BuildPhase::Idle | BuildPhase::Finished => *phase,
            BuildPhase::TestingAngle { angle } => test_angle(run, engine, angle),
            BuildPhase::RetryingFire {
                angle,
                handle,
                waited,
            } => retry_fire(config, run, engine, angle, handle, waited + dt),
            BuildPhase::WaitingForSettle {
                angle,
                handle,
                elapsed,
            } => wait_for_settle(config, run, engine, angle, handle, elapsed + dt),
            BuildPhase::RecordHits {
                angle,
                handle,
                reason,
            } => record_hits(run, engine, angle, handle, reason),
        };
        *phase
    }

    /// Hand over the finished table. `None` unless the sweep has finished.
    pub fn finish(&mut self) -> Option<BuildReport> {
        if self.phase != BuildPhase::Finished {
            return None;
        }
        let run = self.run.take()?;
        self.phase = BuildPhase::Idle;
        Some(BuildReport {
            world_id: run.world_id,
            table: run.table,
            skipped_angles: run.skipped,
            longest_wait_secs: run.longest_wait_secs,
        })
    }

    /// Stop immediately, removing any tracked projectile and discarding all
    /// partial state. A later [`start`](Self::start) begins again at angle 0.
    pub fn abort<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E) {
        let tracked = match self.phase {
            BuildPhase::RetryingFire { handle, .. } | BuildPhase::RecordHits { handle, .. } => {
                handle
            }
            BuildPhase::WaitingForSettle { handle, .. } => Some(handle),
            _ => None,
        };
        if let Some(handle) = tracked {
            engine.remove(handle);
        }
        if let Some(run) = self.run.take() {
            info!(world = %run.world_id, phase = ?self.phase, "firing-table build aborted");
        }
        self.phase = BuildPhase::Idle;
    }

    /// Step `engine` and tick until the sweep finishes, then return the report.
    /// Returns `None` if nothing is running or `dt` is not a positive step.
    pub fn run_to_completion<E: PhysicsEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        dt: f64,
    ) -> Option<BuildReport> {
        if !self.is_running() || !(dt.is_finite() && dt > 0.0) {
            return None;
        }

        let per_angle = (self.config.settle_timeout_secs + self.config.retry_delay_secs) / dt;
        let max_ticks =
            (f64::from(TABLE_SWEEP_LAST_DEG) + 1.0) * (per_angle.ceil() + 4.0) + 16.0;

        for _ in 0..max_ticks as u64 {
            engine.step(dt);
            if self.tick(engine, dt) == BuildPhase::Finished {
                break;
            }
        }
        self.finish()
    }
}

/// Fire at `angle` and start tracking the body the engine hands back.
fn test_angle<E: PhysicsEngine + ?Sized>(run: &mut BuildRun, engine: &mut E, angle: u16) -> BuildPhase {
    run.probes.reset();
    let handle = engine.fire(run.shot(angle));
    match located(engine, handle) {
        Some(handle) => BuildPhase::WaitingForSettle {
            angle,
            handle,
            elapsed: 0.0,
        },
        None => {
            debug!(angle, "projectile not located after firing, retrying");
            BuildPhase::RetryingFire {
                angle,
                handle,
                waited: 0.0,
            }
        }
    }
}

/// After the retry delay, look for the body again, then fire once more;
/// skip the angle if neither attempt yields a live body.
fn retry_fire<E: PhysicsEngine + ?Sized>(
    config: &BuilderConfig,
    run: &mut BuildRun,
    engine: &mut E,
    angle: u16,
    handle: Option<BodyHandle>,
    waited: f64,
) -> BuildPhase {
    if waited < config.retry_delay_secs {
        return BuildPhase::RetryingFire {
            angle,
            handle,
            waited,
        };
    }

    if let Some(handle) = located(engine, handle) {
        return BuildPhase::WaitingForSettle {
            angle,
            handle,
            elapsed: 0.0,
        };
    }
    if let Some(stale) = handle {
        engine.remove(stale);
    }

    let second = engine.fire(run.shot(angle));
    if let Some(handle) = located(engine, second) {
        return BuildPhase::WaitingForSettle {
            angle,
            handle,
            elapsed: 0.0,
        };
    }
    if let Some(stale) = second {
        engine.remove(stale);
    }

    let error = BallisticsError::MissingProjectileHandle { angle };
    warn!(angle, %error, "skipping angle, table will have a gap");
    run.skipped.push(angle);
    advance(run, angle)
}

/// Mark probes under the projectile, then check the settle conditions in order.
fn wait_for_settle<E: PhysicsEngine + ?Sized>(
    config: &BuilderConfig,
    run: &mut BuildRun,
    engine: &mut E,
    angle: u16,
    handle: BodyHandle,
    elapsed: f64,
) -> BuildPhase {
    let Some(body) = engine.body(handle) else {
        run.longest_wait_secs = run.longest_wait_secs.max(elapsed);
        return BuildPhase::RecordHits {
            angle,
            handle: None,
            reason: SettleReason::Vanished,
        };
    };

    let speed = body.speed();
    if speed >= config.min_damage_speed {
        run.probes.mark_circle(body.position, body.radius);
    }

    let reason = if speed < config.settle_speed {
        Some(SettleReason::Stopped)
    } else if body.position.y < -config.offscreen_margin {
        Some(SettleReason::OffScreen)
    } else if body.grounded {
        Some(SettleReason::Grounded)
    } else if elapsed >= config.settle_timeout_secs - WAIT_EPSILON {
        Some(SettleReason::TimedOut)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            run.longest_wait_secs = run.longest_wait_secs.max(elapsed);
            BuildPhase::RecordHits {
                angle,
                handle: Some(handle),
                reason,
            }
        }
        None => BuildPhase::WaitingForSettle {
            angle,
            handle,
            elapsed,
        },
    }
}

/// Attribute every flagged probe to `angle` and release the body.
fn record_hits<E: PhysicsEngine + ?Sized>(
    run: &mut BuildRun,
    engine: &mut E,
    angle: u16,
    handle: Option<BodyHandle>,
    reason: SettleReason,
) -> BuildPhase {
    let mut recorded = 0;
    for cell in run.probes.hit_cells() {
        if run.table.insert(cell, angle) {
            recorded += 1;
        }
    }
    if let Some(handle) = handle {
        engine.remove(handle);
    }
    debug!(angle, ?reason, cells = recorded, "angle recorded");
    advance(run, angle)
}

fn advance(run: &mut BuildRun, angle: u16) -> BuildPhase {
    if angle >= TABLE_SWEEP_LAST_DEG {
        run.table.strip_empty();
        let stats = run.table.stats();
        info!(
            world = %run.world_id,
            cells = stats.cells,
            entries = stats.entries,
            skipped = run.skipped.len(),
            "firing-table build finished"
        );
        BuildPhase::Finished
    } else {
        BuildPhase::TestingAngle { angle: angle + 1 }
    }
}

fn located<E: PhysicsEngine + ?Sized>(engine: &E, handle: Option<BodyHandle>) -> Option<BodyHandle> {
    handle.filter(|&h| engine.body(h).is_some())
}
