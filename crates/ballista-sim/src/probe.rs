//! Probe grid: fixed points covering the play field, flagged when a
//! projectile passes over them during one angle's flight.

use glam::DVec2;

use ballista_core::constants::GRID_RESOLUTION;
use ballista_core::grid::GridCell;

/// Grid-aligned probe points over `[0, width] × [0, height]`.
#[derive(Debug, Clone)]
pub struct ProbeGrid {
    columns: usize,
    rows: usize,
    hits: Vec<bool>,
}

impl ProbeGrid {
    pub fn new(width: f64, height: f64) -> Self {
        let columns = (width.max(0.0) / GRID_RESOLUTION).floor() as usize + 1;
        let rows = (height.max(0.0) / GRID_RESOLUTION).floor() as usize + 1;
        Self {
            columns,
            rows,
            hits: vec![false; columns * rows],
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Clear every hit flag. Called before each angle is tested.
    pub fn reset(&mut self) {
        self.hits.fill(false);
    }

    fn point(&self, col: usize, row: usize) -> DVec2 {
        DVec2::new(col as f64 * GRID_RESOLUTION, row as f64 * GRID_RESOLUTION)
    }

    /// Every probe point, row-major.
    pub fn points(&self) -> impl Iterator<Item = DVec2> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |col| self.point(col, row)))
    }

    /// Flag unhit probes inside the circle at `center` with `radius`.
    /// Returns how many were newly flagged.
    pub fn mark_circle(&mut self, center: DVec2, radius: f64) -> usize {
        let Some((cols, rows)) = self.span(center, radius) else {
            return 0;
        };
        let radius_sq = radius * radius;
        let mut marked = 0;
        for row in rows.0..=rows.1 {
            for col in cols.0..=cols.1 {
                let idx = row * self.columns + col;
                if self.hits[idx] {
                    continue;
                }
                if self.point(col, row).distance_squared(center) <= radius_sq {
                    self.hits[idx] = true;
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Cells of every flagged probe.
    pub fn hit_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.hits
            .iter()
            .enumerate()
            .filter(|(_, &hit)| hit)
            .map(move |(idx, _)| {
                GridCell::containing(self.point(idx % self.columns, idx / self.columns))
            })
    }

    /// Index ranges of probes that could lie inside the circle.
    fn span(&self, center: DVec2, radius: f64) -> Option<((usize, usize), (usize, usize))> {
        let axis = |lo: f64, hi: f64, count: usize| -> Option<(usize, usize)> {
            let first = (lo / GRID_RESOLUTION).ceil().max(0.0);
            let last = (hi / GRID_RESOLUTION).floor().min(count as f64 - 1.0);
            if first > last {
                return None;
            }
            Some((first as usize, last as usize))
        };
        let cols = axis(center.x - radius, center.x + radius, self.columns)?;
        let rows = axis(center.y - radius, center.y + radius, self.rows)?;
        Some((cols, rows))
    }
}
