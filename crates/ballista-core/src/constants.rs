//! Targeting constants and tuning parameters.
//!
//! Units are pixels and seconds throughout. World coordinates are y-up:
//! gravity is a positive magnitude that pulls vertical velocity down.

/// Frame rate the host game steps its physics at (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per frame.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Lookup grid ---

/// Spacing between firing-table keys and probe points (pixels).
/// Construction and lookup must agree on this value.
pub const GRID_RESOLUTION: f64 = 10.0;

// --- Trajectory simulation ---

/// Largest fraction of velocity drag may remove in a single step.
/// Keeps a large `drag * dt` from reversing the velocity.
pub const DRAG_FACTOR_CLAMP: f64 = 0.99;

/// Simulated flight time after which a trajectory is abandoned (seconds).
pub const SIM_MAX_TIME_SECS: f64 = 10.0;

/// Distance past the caller's horizontal bound at which a trajectory stops (pixels).
pub const SIM_OVERSHOOT_MARGIN: f64 = 500.0;

/// Drop below the start height at which a trajectory stops (pixels).
pub const SIM_MAX_DROP: f64 = 2000.0;

// --- Live solver ---

/// First candidate angle of the per-shot sweep (degrees).
pub const SOLVER_SWEEP_START_DEG: f64 = -5.0;

/// Last candidate angle of the per-shot sweep (degrees).
pub const SOLVER_SWEEP_END_DEG: f64 = 185.0;

/// Angular step of the per-shot sweep (degrees).
pub const SOLVER_SWEEP_STEP_DEG: f64 = 0.1;

/// Maximum sample-to-target distance that counts as a hit (pixels).
pub const HIT_TOLERANCE: f64 = 20.0;

/// Solutions closer than this are the same solution (radians).
pub const DUPLICATE_ANGLE_WINDOW: f64 = 0.05;

/// Angle used when no solution exists for a target (radians, 45°).
pub const FALLBACK_ANGLE: f64 = std::f64::consts::FRAC_PI_4;

// --- Table building ---

/// Last angle of the table sweep (degrees). The sweep starts at 0.
pub const TABLE_SWEEP_LAST_DEG: u16 = 359;

/// Speed below which a projectile counts as settled (px/s).
pub const SETTLE_SPEED: f64 = 0.1;

/// Distance below the bottom of the field at which a projectile is off-screen (pixels).
pub const OFFSCREEN_MARGIN: f64 = 100.0;

/// Longest a single angle may wait for its projectile to settle (seconds).
pub const SETTLE_TIMEOUT_SECS: f64 = 10.0;

/// Delay before re-locating a projectile the engine did not report (seconds).
pub const RETRY_DELAY_SECS: f64 = 0.1;

/// Slowest a projectile may move and still deal damage (px/s).
pub const MIN_DAMAGE_SPEED: f64 = 50.0;

// --- Play field ---

/// Default play field width (pixels).
pub const FIELD_WIDTH: f64 = 1280.0;

/// Default play field height (pixels).
pub const FIELD_HEIGHT: f64 = 720.0;

/// Height of the ground plane (pixels).
pub const GROUND_Y: f64 = 0.0;

/// Default projectile radius (pixels).
pub const PROJECTILE_RADIUS: f64 = 8.0;
