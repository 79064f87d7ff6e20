//! Nearest-neighbor coordinate resolution on sorted axes.
//!
//! Exact midpoints between two axis values resolve to the lower index on both
//! axes. Values outside an axis clamp to its first or last index.

use crate::store::GridAxes;
use crate::types::GridIndex;

/// Index of the axis value nearest to `value`.
///
/// `axis` must be sorted ascending and non-empty (guaranteed by [`GridAxes`]).
pub fn nearest_index(axis: &[f64], value: f64) -> usize {
    let last = axis.len().saturating_sub(1);
    let j = axis.partition_point(|&a| a < value);
    if j == 0 {
        return 0;
    }
    if j > last {
        return last;
    }
    let below = value - axis[j - 1];
    let above = axis[j] - value;
    if below <= above {
        j - 1
    } else {
        j
    }
}

/// Resolve a decimal-degree coordinate to its nearest grid cell.
pub fn resolve(axes: &GridAxes, lon: f64, lat: f64) -> GridIndex {
    GridIndex::new(nearest_index(axes.lon(), lon), nearest_index(axes.lat(), lat))
}
