//! Query Resolver: composes bounds, planners, resolver and extractor per mode.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::bounds::BoundsIndex;
use crate::config::EngineConfig;
use crate::error::{QueryError, Result};
use crate::extract::{extract_point, extract_window};
use crate::plan::{select_box_day, BoxPlanner, RangePlanner};
use crate::request::{BoxQuery, PointQuery, QueryRequest};
use crate::resolve::resolve;
use crate::store::{GridAxes, SnapshotStore};
use crate::types::{BoundsRecord, GridIndex, QueryResult};

/// Stateless request resolver over a snapshot store.
pub struct QueryEngine {
    store: Arc<dyn SnapshotStore>,
    bounds: Arc<BoundsIndex>,
    config: EngineConfig,
    box_planner: BoxPlanner,
    range_planner: RangePlanner,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        bounds: Arc<BoundsIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            box_planner: BoxPlanner::new(&config),
            range_planner: RangePlanner::new(config.max_days),
            store,
            bounds,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bounds(&self) -> &Arc<BoundsIndex> {
        &self.bounds
    }

    /// Resolve a validated request into rows.
    #[instrument(skip_all, fields(mode = request.mode_label()))]
    pub async fn resolve(&self, request: &QueryRequest) -> Result<QueryResult> {
        let started = Instant::now();
        let bounds = self.bounds.get_bounds().await?;

        let result = match request {
            QueryRequest::Point(q) => self.resolve_point(q, &bounds).await?,
            QueryRequest::Box(q) => self.resolve_box(q, &bounds).await?,
        };

        info!(
            rows = result.row_count,
            stride = ?result.stride,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query resolved"
        );
        Ok(result)
    }

    async fn resolve_point(&self, q: &PointQuery, bounds: &BoundsRecord) -> Result<QueryResult> {
        let days = self
            .range_planner
            .plan(&q.dates, bounds, self.store.as_ref())
            .await?;

        let mut rows = Vec::with_capacity(days.len());
        let mut resolved: Option<(GridAxes, GridIndex)> = None;

        for day in days {
            // Withdrawn between the existence check and the open: treat as a gap.
            let Some(snapshot) = self.store.open(day).await? else {
                debug!(%day, "Snapshot vanished before open, skipping");
                continue;
            };

            let index = match &resolved {
                Some((axes, index)) if axes.same_grid(snapshot.axes()) => *index,
                _ => {
                    let index = resolve(snapshot.axes(), q.lon, q.lat);
                    debug!(
                        %day,
                        lon_index = index.lon_index,
                        lat_index = index.lat_index,
                        "Resolved point"
                    );
                    resolved = Some((snapshot.axes().clone(), index));
                    index
                }
            };

            rows.push(extract_point(snapshot.as_ref(), index, &q.fields, q.mode).await?);
        }

        if rows.is_empty() {
            return Err(QueryError::DateOutOfRange { bounds: *bounds });
        }
        Ok(QueryResult::points(rows))
    }

    async fn resolve_box(&self, q: &BoxQuery, bounds: &BoundsRecord) -> Result<QueryResult> {
        let day = select_box_day(&q.dates, bounds)?;
        let snapshot = self
            .store
            .open(day)
            .await?
            .ok_or(QueryError::DateOutOfRange { bounds: *bounds })?;

        let plan = self
            .box_planner
            .plan(snapshot.axes(), &q.geo_box(), q.sample)?;
        debug!(
            %day,
            sample = plan.sample,
            estimated = plan.estimated_point_count,
            picked = plan.picked_point_count,
            escalations = plan.escalations,
            "Box planned"
        );

        let rows = extract_window(snapshot.as_ref(), &plan.window, &q.fields, q.mode).await?;
        Ok(QueryResult::sub_grid(rows, plan.sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field, FieldSet};
    use crate::request::{DateSelection, OutputMode};
    use crate::store::{MemorySnapshot, MemorySnapshotStore};
    use chrono::{Datelike, NaiveDate};
    use std::time::Duration;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn axes() -> GridAxes {
        let lon = (0..=10).map(|i| 120.0 + i as f64 * 0.5).collect();
        let lat = (0..=6).map(|j| 20.0 + j as f64 * 0.5).collect();
        GridAxes::new(lon, lat).unwrap()
    }

    fn engine(days: &[NaiveDate]) -> QueryEngine {
        let store = days.iter().fold(MemorySnapshotStore::new(), |s, d| {
            let ordinal = d.ordinal() as f32;
            s.with_snapshot(
                MemorySnapshot::new(*d, axes())
                    .with_field_fn(Field::Sst, move |j, i| ordinal + (j * 100 + i) as f32),
            )
        });
        let store: Arc<dyn SnapshotStore> = Arc::new(store);
        let bounds = Arc::new(BoundsIndex::new(store.clone(), None, Duration::from_secs(60)));
        QueryEngine::new(store, bounds, EngineConfig::default())
    }

    fn point(lon: f64, lat: f64, dates: DateSelection) -> QueryRequest {
        QueryRequest::Point(PointQuery {
            lon,
            lat,
            dates,
            fields: FieldSet::default(),
            mode: OutputMode::Full,
        })
    }

    #[tokio::test]
    async fn test_point_latest() {
        let engine = engine(&[day(10, 27), day(10, 28)]);
        let result = engine
            .resolve(&point(121.1, 21.4, DateSelection::latest()))
            .await
            .unwrap();
        assert_eq!(result.row_count, 1);
        let row = &result.rows[0];
        assert_eq!(row.date, day(10, 28));
        assert_eq!((row.lon, row.lat), (121.0, 21.5));
        assert_eq!(result.stride, None);
    }

    #[tokio::test]
    async fn test_point_absent_single_day() {
        let engine = engine(&[day(10, 27), day(10, 29)]);
        let err = engine
            .resolve(&point(121.0, 21.0, DateSelection::day(day(10, 28))))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::DateOutOfRange { .. }));
    }

    #[tokio::test]
    async fn test_box_reads_requested_day() {
        let engine = engine(&[day(10, 27), day(10, 28)]);
        let request = QueryRequest::Box(BoxQuery {
            lon0: 121.0,
            lat0: 22.0,
            lon1: 120.0,
            lat1: 21.0,
            dates: DateSelection::day(day(10, 27)),
            fields: FieldSet::default(),
            sample: None,
            mode: OutputMode::Full,
        });
        let result = engine.resolve(&request).await.unwrap();
        assert_eq!(result.stride, Some(1));
        assert_eq!(result.row_count, 9);
        assert!(result.rows.iter().all(|r| r.date == day(10, 27)));
        assert_eq!((result.rows[0].lon, result.rows[0].lat), (120.0, 21.0));
        assert_eq!((result.rows[8].lon, result.rows[8].lat), (121.0, 22.0));
    }

    #[tokio::test]
    async fn test_box_absent_day() {
        let engine = engine(&[day(10, 27), day(10, 29)]);
        let request = QueryRequest::Box(BoxQuery {
            lon0: 120.0,
            lat0: 20.0,
            lon1: 121.0,
            lat1: 21.0,
            dates: DateSelection::day(day(10, 28)),
            fields: FieldSet::default(),
            sample: Some(1),
            mode: OutputMode::Full,
        });
        let err = engine.resolve(&request).await.unwrap_err();
        assert!(err.to_string().contains("2025-10-27/2025-10-29"));
    }
}
