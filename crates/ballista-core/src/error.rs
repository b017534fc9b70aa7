//! Error taxonomy for targeting and table handling.
//!
//! None of these are fatal: every caller degrades to a fallback angle or an
//! empty result set.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BallisticsError {
    /// Target behind the launch point, or no swept angle came close enough.
    #[error("target unreachable: {reason}")]
    TargetUnreachable { reason: &'static str },

    /// The physics engine did not report the projectile fired for a table angle.
    #[error("no projectile located after firing at {angle} degrees")]
    MissingProjectileHandle { angle: u16 },

    /// A world's firing table could not be loaded.
    #[error("failed to load firing table for world '{world}': {reason}")]
    TableLoad { world: String, reason: String },

    /// A firing table file is structurally invalid.
    #[error("malformed firing table: {0}")]
    TableFormat(String),

    /// A world profile is physically meaningless.
    #[error("invalid world profile: {0}")]
    InvalidProfile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
