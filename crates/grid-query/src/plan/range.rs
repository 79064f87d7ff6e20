//! Range Planner: date clamping, span capping and gap skipping.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::request::DateSelection;
use crate::store::SnapshotStore;
use crate::types::BoundsRecord;

/// Plans the days read by a point request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlanner {
    pub max_days: u32,
}

impl RangePlanner {
    pub fn new(max_days: u32) -> Self {
        Self {
            max_days: max_days.max(1),
        }
    }

    /// Clamp a selection into `bounds` and cap it at `max_days`.
    ///
    /// Neither date selects `latest`; one date selects that day alone;
    /// reversed dates are swapped. An empty clamped interval fails with
    /// `DateOutOfRange`.
    pub fn clamp(
        &self,
        dates: &DateSelection,
        bounds: &BoundsRecord,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let (start, end) = match (dates.start, dates.end) {
            (None, None) => (bounds.latest, bounds.latest),
            (Some(day), None) | (None, Some(day)) => (day, day),
            (Some(s), Some(e)) => (s.min(e), s.max(e)),
        };

        let lo = start.max(bounds.earliest);
        let hi = end.min(bounds.latest);
        if lo > hi {
            return Err(QueryError::DateOutOfRange { bounds: *bounds });
        }

        let capped = lo
            .checked_add_days(Days::new(u64::from(self.max_days.max(1)) - 1))
            .map_or(hi, |cap| cap.min(hi));
        Ok((lo, capped))
    }

    /// Published days of the clamped interval, ascending.
    ///
    /// Absent days are skipped; if none remain the request fails with
    /// `DateOutOfRange`.
    pub async fn plan(
        &self,
        dates: &DateSelection,
        bounds: &BoundsRecord,
        store: &dyn SnapshotStore,
    ) -> Result<Vec<NaiveDate>> {
        let (lo, hi) = self.clamp(dates, bounds)?;

        let mut present = Vec::new();
        let mut skipped = 0usize;
        for day in lo.iter_days().take_while(|d| *d <= hi) {
            if store.exists(day).await {
                present.push(day);
            } else {
                skipped += 1;
            }
        }

        debug!(%lo, %hi, present = present.len(), skipped, "Range planned");

        if present.is_empty() {
            return Err(QueryError::DateOutOfRange { bounds: *bounds });
        }
        Ok(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::store::{GridAxes, MemorySnapshot, MemorySnapshotStore};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn bounds() -> BoundsRecord {
        BoundsRecord::new(day(10, 1), day(11, 30)).unwrap()
    }

    fn store_with(days: impl IntoIterator<Item = NaiveDate>) -> MemorySnapshotStore {
        let axes = GridAxes::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        days.into_iter().fold(MemorySnapshotStore::new(), |store, d| {
            store.with_snapshot(
                MemorySnapshot::new(d, axes.clone()).with_field_fn(Field::Sst, |_, _| 0.0),
            )
        })
    }

    #[test]
    fn test_clamp_defaults_and_single_dates() {
        let p = RangePlanner::new(31);
        let b = bounds();
        assert_eq!(p.clamp(&DateSelection::latest(), &b).unwrap(), (day(11, 30), day(11, 30)));
        assert_eq!(
            p.clamp(&DateSelection::day(day(10, 5)), &b).unwrap(),
            (day(10, 5), day(10, 5))
        );
        assert_eq!(
            p.clamp(&DateSelection::new(None, Some(day(10, 6))), &b).unwrap(),
            (day(10, 6), day(10, 6))
        );
    }

    #[test]
    fn test_clamp_into_bounds_and_swap() {
        let p = RangePlanner::new(31);
        let b = bounds();
        let sel = DateSelection::new(Some(day(11, 28)), Some(day(9, 1)));
        // Swapped to 09-01..11-28, clamped to 10-01, capped at 31 days.
        assert_eq!(p.clamp(&sel, &b).unwrap(), (day(10, 1), day(10, 31)));

        let sel = DateSelection::new(Some(day(11, 25)), Some(day(12, 20)));
        assert_eq!(p.clamp(&sel, &b).unwrap(), (day(11, 25), day(11, 30)));
    }

    #[test]
    fn test_clamp_empty_interval_is_out_of_range() {
        let p = RangePlanner::new(31);
        let b = bounds();
        for sel in [
            DateSelection::new(Some(day(12, 1)), Some(day(12, 5))),
            DateSelection::new(Some(day(9, 1)), Some(day(9, 30))),
            DateSelection::day(day(12, 24)),
        ] {
            let err = p.clamp(&sel, &b).unwrap_err();
            assert!(err.to_string().contains("2025-10-01/2025-11-30"));
        }
    }

    #[tokio::test]
    async fn test_plan_skips_gaps() {
        let store = store_with(
            [27, 28, 29, 31]
                .into_iter()
                .map(|d| day(10, d))
                .chain([1, 2].into_iter().map(|d| day(11, d))),
        );
        let b = BoundsRecord::new(day(10, 27), day(11, 2)).unwrap();
        let sel = DateSelection::new(Some(day(10, 27)), Some(day(11, 2)));
        let days = RangePlanner::new(31).plan(&sel, &b, &store).await.unwrap();
        assert_eq!(days.len(), 6);
        assert!(!days.contains(&day(10, 30)));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_plan_caps_span() {
        let store = store_with(day(10, 1).iter_days().take(61));
        let sel = DateSelection::new(Some(day(10, 1)), Some(day(11, 30)));
        let days = RangePlanner::new(31).plan(&sel, &bounds(), &store).await.unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days.first(), Some(&day(10, 1)));
        assert_eq!(days.last(), Some(&day(10, 31)));
    }

    #[tokio::test]
    async fn test_plan_all_absent_is_out_of_range() {
        let store = store_with([day(10, 1), day(11, 30)]);
        let sel = DateSelection::new(Some(day(10, 10)), Some(day(10, 12)));
        let err = RangePlanner::new(31).plan(&sel, &bounds(), &store).await.unwrap_err();
        assert!(matches!(err, QueryError::DateOutOfRange { .. }));
    }
}
