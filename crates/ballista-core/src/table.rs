//! Firing tables: grid cell → launch angles (whole degrees) that reach it.
//!
//! Backed by ordered maps so iteration and serialization are always
//! x-ascending, then y-ascending, with each angle list ascending.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::{snap, GridCell};

/// Precomputed per-world targeting table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiringTable {
    columns: BTreeMap<i32, BTreeMap<i32, Vec<u16>>>,
}

/// Coverage summary of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableStats {
    /// Cells with at least one angle.
    pub cells: usize,
    /// Sum of angle-list lengths.
    pub entries: usize,
    /// Longest angle list.
    pub max_angles_per_cell: usize,
    /// Distinct angles that hit anything.
    pub distinct_angles: usize,
    /// Bounding box of covered cells as (min, max), if any.
    pub bounds: Option<(GridCell, GridCell)>,
}

impl FiringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a cell exists, possibly with no angles.
    pub fn ensure_cell(&mut self, cell: GridCell) {
        self.columns
            .entry(cell.x)
            .or_default()
            .entry(cell.y)
            .or_default();
    }

    /// Record `angle` for `cell`. Returns false when it was already recorded.
    pub fn insert(&mut self, cell: GridCell, angle: u16) -> bool {
        let angles = self
            .columns
            .entry(cell.x)
            .or_default()
            .entry(cell.y)
            .or_default();
        match angles.binary_search(&angle) {
            Ok(_) => false,
            Err(pos) => {
                angles.insert(pos, angle);
                true
            }
        }
    }

    /// Angles recorded for an exact cell.
    pub fn angles_at(&self, cell: GridCell) -> &[u16] {
        self.columns
            .get(&cell.x)
            .and_then(|column| column.get(&cell.y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Angles in radians for an arbitrary world point, snapped to the grid.
    /// Non-finite coordinates match no cell.
    pub fn lookup(&self, x: f64, y: f64) -> Vec<f64> {
        if !(x.is_finite() && y.is_finite()) {
            return Vec::new();
        }
        self.angles_at(GridCell::new(snap(x), snap(y)))
            .iter()
            .map(|&deg| f64::from(deg).to_radians())
            .collect()
    }

    /// Drop cells with no angles, and columns left empty by that.
    pub fn strip_empty(&mut self) {
        for column in self.columns.values_mut() {
            column.retain(|_, angles| !angles.is_empty());
        }
        self.columns.retain(|_, column| !column.is_empty());
    }

    /// Iterate cells in table order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCell, &[u16])> + '_ {
        self.columns.iter().flat_map(|(&x, column)| {
            column
                .iter()
                .map(move |(&y, angles)| (GridCell::new(x, y), angles.as_slice()))
        })
    }

    /// Number of cells, including empty ones not yet stripped.
    pub fn len(&self) -> usize {
        self.columns.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats::default();
        let mut seen = [false; 360];
        let mut min = GridCell::new(i32::MAX, i32::MAX);
        let mut max = GridCell::new(i32::MIN, i32::MIN);

        for (cell, angles) in self.iter() {
            if angles.is_empty() {
                continue;
            }
            stats.cells += 1;
            stats.entries += angles.len();
            stats.max_angles_per_cell = stats.max_angles_per_cell.max(angles.len());
            for &angle in angles {
                if let Some(slot) = seen.get_mut(angle as usize) {
                    *slot = true;
                }
            }
            min = GridCell::new(min.x.min(cell.x), min.y.min(cell.y));
            max = GridCell::new(max.x.max(cell.x), max.y.max(cell.y));
        }

        stats.distinct_angles = seen.iter().filter(|&&s| s).count();
        if stats.cells > 0 {
            stats.bounds = Some((min, max));
        }
        stats
    }
}
