//! Request planners.
//!
//! [`BoxPlanner`] bounds the sub-grid a box request may touch; [`RangePlanner`]
//! turns a point request's date selection into the list of published days to
//! read.

mod box_plan;
mod range;

pub use box_plan::{BoxPlan, BoxPlanner};
pub use range::RangePlanner;

use chrono::NaiveDate;

use crate::error::{QueryError, Result};
use crate::request::DateSelection;
use crate::types::BoundsRecord;

/// Day read by a box request: `start`, else `end`, else `latest`.
///
/// Box mode does not clamp; a day outside the bounds is rejected outright.
pub fn select_box_day(dates: &DateSelection, bounds: &BoundsRecord) -> Result<NaiveDate> {
    let day = dates.single_day().unwrap_or(bounds.latest);
    if !bounds.contains(day) {
        return Err(QueryError::DateOutOfRange { bounds: *bounds });
    }
    Ok(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_box_day_selection() {
        let bounds = BoundsRecord::new(day(10, 27), day(11, 2)).unwrap();

        assert_eq!(select_box_day(&DateSelection::latest(), &bounds).unwrap(), day(11, 2));
        assert_eq!(
            select_box_day(&DateSelection::new(Some(day(10, 28)), Some(day(11, 1))), &bounds)
                .unwrap(),
            day(10, 28)
        );
        assert_eq!(
            select_box_day(&DateSelection::new(None, Some(day(11, 1))), &bounds).unwrap(),
            day(11, 1)
        );
    }

    #[test]
    fn test_box_day_outside_bounds() {
        let bounds = BoundsRecord::new(day(10, 27), day(11, 2)).unwrap();
        let err = select_box_day(&DateSelection::day(day(11, 3)), &bounds).unwrap_err();
        assert!(err.to_string().contains("2025-10-27/2025-11-02"));
    }
}
