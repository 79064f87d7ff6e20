//! Generators for synthetic axes and field grids.
//!
//! Field grids are row-major `[lat][lon]`, matching the snapshot layout.

use chrono::NaiveDate;

/// An ascending axis `start, start + step, ...` with `n` values.
///
/// Values are computed as `start + i * step` (not accumulated) so they match
/// what an ingestion job writes for a regular grid.
///
/// ```
/// use test_utils::regular_axis;
///
/// let axis = regular_axis(119.0, 0.5, 5);
/// assert_eq!(axis, vec![119.0, 119.5, 120.0, 120.5, 121.0]);
/// ```
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Axis covering `[start, end]` inclusive at `step` spacing.
pub fn axis_between(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step + 1e-9).floor() as usize + 1;
    regular_axis(start, step, n)
}

/// A grid whose value encodes its indices: `lat_index * 1000 + lon_index`.
///
/// ```
/// use test_utils::index_grid;
///
/// let grid = index_grid(3, 2);
/// assert_eq!(grid, vec![0.0, 1.0, 2.0, 1000.0, 1001.0, 1002.0]);
/// ```
pub fn index_grid(nx: usize, ny: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            data.push((j * 1000 + i) as f32);
        }
    }
    data
}

/// Sea-surface-temperature-like values in degrees Celsius.
///
/// Warm at the first latitude row, cooling by 0.01 degC per row, with a
/// small longitudinal ripple.
pub fn sst_grid(nx: usize, ny: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let ripple = ((i % 10) as f32) * 0.001;
            data.push(29.5 - j as f32 * 0.01 + ripple);
        }
    }
    data
}

/// Replace every `period`-th cell (row-major) with NaN.
pub fn with_missing(mut data: Vec<f32>, period: usize) -> Vec<f32> {
    for v in data.iter_mut().step_by(period.max(1)) {
        *v = f32::NAN;
    }
    data
}

/// Consecutive days from `start` (inclusive), minus the listed gaps.
pub fn days_with_gaps(start: NaiveDate, count: usize, gaps: &[NaiveDate]) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take(count)
        .filter(|d| !gaps.contains(d))
        .collect()
}
