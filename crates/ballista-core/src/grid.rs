//! The lookup grid shared by table construction and table lookup.
//!
//! Both sides must snap coordinates through [`snap`]; a different rounding
//! rule on either side makes lookups silently miss recorded cells.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::GRID_RESOLUTION;

/// Grid spacing as an integer pixel count.
pub const GRID_STEP: i32 = GRID_RESOLUTION as i32;

/// Round a coordinate to the nearest grid line (half away from zero).
pub fn snap(value: f64) -> i32 {
    ((value / GRID_RESOLUTION).round() * GRID_RESOLUTION) as i32
}

/// A firing-table key: a grid-aligned pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell a world-space point rounds to.
    pub fn containing(point: DVec2) -> Self {
        Self {
            x: snap(point.x),
            y: snap(point.y),
        }
    }

    pub fn point(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }

    /// Whether both coordinates lie on grid lines.
    pub fn is_aligned(&self) -> bool {
        self.x % GRID_STEP == 0 && self.y % GRID_STEP == 0
    }
}
