//! Box Planner: stride selection under the point ceiling.

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{QueryError, Result};
use crate::resolve::resolve;
use crate::store::GridAxes;
use crate::types::{GeoBox, GridWindow, IndexSpan};

/// Relative slack absorbing float error in `extent / spacing`.
const SPACING_EPSILON: f64 = 1e-9;

/// Outcome of box planning.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlan {
    /// Normalized box, clamped to the grid extent.
    pub geo_box: GeoBox,
    /// Effective stride on both axes.
    pub sample: usize,
    /// Point count estimated from the box extent and nominal spacing.
    pub estimated_point_count: usize,
    /// Picked sub-grid.
    pub window: GridWindow,
    /// Exact number of picked grid points.
    pub picked_point_count: usize,
    /// Number of stride doublings applied.
    pub escalations: u32,
}

impl BoxPlan {
    /// Lower-left corner (lon, lat).
    pub fn lo_norm(&self) -> (f64, f64) {
        (self.geo_box.min_lon, self.geo_box.min_lat)
    }

    /// Upper-right corner (lon, lat).
    pub fn hi_norm(&self) -> (f64, f64) {
        (self.geo_box.max_lon, self.geo_box.max_lat)
    }
}

/// Chooses a stride so the picked sub-grid stays under `point_limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlanner {
    pub grid_spacing_deg: f64,
    pub point_limit: usize,
    pub max_escalations: u32,
    pub auto_stride: bool,
}

impl BoxPlanner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            grid_spacing_deg: config.grid_spacing_deg,
            point_limit: config.point_limit,
            max_escalations: config.max_stride_escalations,
            auto_stride: config.auto_stride,
        }
    }

    /// Estimated (nx, ny, total) for a normalized box.
    pub fn estimate(&self, geo_box: &GeoBox) -> (usize, usize, usize) {
        let cells = |extent: f64| {
            let steps = extent / self.grid_spacing_deg;
            (steps + steps.abs() * SPACING_EPSILON).floor().max(0.0) as usize + 1
        };
        let nx = cells(geo_box.width());
        let ny = cells(geo_box.height());
        (nx, ny, nx.saturating_mul(ny))
    }

    /// Stride implied by an estimated point count.
    pub fn initial_sample(&self, total: usize) -> usize {
        if total <= self.point_limit {
            1
        } else {
            (total as f64 / self.point_limit as f64).sqrt().ceil() as usize
        }
    }

    /// Plan a box read against a snapshot's axes.
    ///
    /// The box is first clamped to the axes' extent, and the point estimate
    /// (and so `estimated_point_count`) is taken on that clamped box, not on
    /// the raw request.
    ///
    /// `requested_sample` overrides the starting stride. Without it the stride
    /// starts at the estimate (or 1 when `auto_stride` is off). While the
    /// exact picked count exceeds the ceiling the stride doubles, at most
    /// `max_escalations` times.
    pub fn plan(
        &self,
        axes: &GridAxes,
        geo_box: &GeoBox,
        requested_sample: Option<usize>,
    ) -> Result<BoxPlan> {
        let clamped = geo_box.clamp_to(axes.lon_range(), axes.lat_range());
        let (nx, ny, total) = self.estimate(&clamped);

        let mut sample = match requested_sample {
            Some(s) => s.max(1),
            None if self.auto_stride => self.initial_sample(total),
            None => 1,
        };

        let lo = resolve(axes, clamped.min_lon, clamped.min_lat);
        let hi = resolve(axes, clamped.max_lon, clamped.max_lat);

        let mut escalations = 0;
        loop {
            let window = GridWindow::new(
                IndexSpan::new(lo.lat_index, hi.lat_index, sample),
                IndexSpan::new(lo.lon_index, hi.lon_index, sample),
            );
            let picked = window.point_count();

            if picked <= self.point_limit {
                debug!(
                    nx,
                    ny,
                    estimated = total,
                    picked,
                    sample,
                    escalations,
                    "Box plan accepted"
                );
                return Ok(BoxPlan {
                    geo_box: clamped,
                    sample,
                    estimated_point_count: total,
                    window,
                    picked_point_count: picked,
                    escalations,
                });
            }

            if escalations >= self.max_escalations {
                return Err(QueryError::TooManyPoints {
                    count: picked,
                    limit: self.point_limit,
                });
            }

            debug!(picked, limit = self.point_limit, sample, "Box over limit, doubling stride");
            sample *= 2;
            escalations += 1;
        }
    }
}
