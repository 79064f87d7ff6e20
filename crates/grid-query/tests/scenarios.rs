//! End-to-end query scenarios against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use grid_query::{
    BoundsIndex, EngineConfig, Field, GridAxes, MemorySnapshot, MemorySnapshotStore, QueryEngine,
    QueryError, QueryRequest, RawQuery, SnapshotStore,
};
use test_utils::{assert_coords_approx_eq, axis_between, bbox, days_with_gaps};

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn engine_over(store: MemorySnapshotStore, config: EngineConfig) -> QueryEngine {
    let store: Arc<dyn SnapshotStore> = Arc::new(store);
    let bounds = Arc::new(BoundsIndex::new(
        store.clone(),
        None,
        Duration::from_secs(300),
    ));
    QueryEngine::new(store, bounds, config)
}

/// 0.01 degree grid over [118, 124] x [19, 27] with sst = 20 + lat_index/1000.
fn taiwan_snapshot(date: NaiveDate) -> MemorySnapshot {
    let axes = GridAxes::new(
        axis_between(118.0, 124.0, 0.01),
        axis_between(19.0, 27.0, 0.01),
    )
    .unwrap();
    MemorySnapshot::new(date, axes)
        .with_field_fn(Field::Sst, |j, _| 20.0 + j as f32 / 1000.0)
}

fn raw(pairs: &[(&str, &str)]) -> RawQuery {
    let mut q = RawQuery::default();
    for (k, v) in pairs {
        let v = Some(v.to_string());
        match *k {
            "lon0" => q.lon0 = v,
            "lat0" => q.lat0 = v,
            "lon1" => q.lon1 = v,
            "lat1" => q.lat1 = v,
            "start" => q.start = v,
            "end" => q.end = v,
            "append" => q.append = v,
            "sample" => q.sample = v,
            _ => panic!("unknown key {}", k),
        }
    }
    q
}

async fn run(engine: &QueryEngine, pairs: &[(&str, &str)]) -> grid_query::Result<grid_query::QueryResult> {
    let request = QueryRequest::from_raw(&raw(pairs))?;
    engine.resolve(&request).await
}

fn box_params(b: (f64, f64, f64, f64)) -> Vec<(&'static str, String)> {
    vec![
        ("lon0", b.0.to_string()),
        ("lat0", b.1.to_string()),
        ("lon1", b.2.to_string()),
        ("lat1", b.3.to_string()),
    ]
}

fn as_pairs<'a>(owned: &'a [(&'static str, String)]) -> Vec<(&'a str, &'a str)> {
    owned.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

#[tokio::test]
async fn scenario_a_point_without_dates_uses_latest() {
    let store = MemorySnapshotStore::new()
        .with_snapshot(taiwan_snapshot(day(10, 31)))
        .with_snapshot(taiwan_snapshot(day(11, 2)));
    let engine = engine_over(store, EngineConfig::default());

    let result = run(&engine, &[("lon0", "121.5"), ("lat0", "23.1")])
        .await
        .unwrap();
    assert_eq!(result.row_count, 1);
    assert_eq!(result.stride, None);
    let row = &result.rows[0];
    assert_eq!(row.date, day(11, 2));
    assert_coords_approx_eq!((row.lon, row.lat), (121.5, 23.1), 1e-5);
}

#[tokio::test]
async fn scenario_b_point_range_skips_gap() {
    let small = GridAxes::new(axis_between(120.0, 122.0, 0.25), axis_between(22.0, 24.0, 0.25))
        .unwrap();
    let store = days_with_gaps(day(10, 27), 7, &[day(10, 30)])
        .into_iter()
        .fold(MemorySnapshotStore::new(), |s, d| {
            s.with_snapshot(
                MemorySnapshot::new(d, small.clone()).with_field_fn(Field::Sst, |_, _| 25.0),
            )
        });
    let engine = engine_over(store, EngineConfig::default());

    let result = run(
        &engine,
        &[
            ("lon0", "121"),
            ("lat0", "23"),
            ("start", "2025-10-27"),
            ("end", "2025-11-02"),
        ],
    )
    .await
    .unwrap();

    let dates: Vec<NaiveDate> = result.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates.len(), 6);
    assert!(!dates.contains(&day(10, 30)));
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(dates.first(), Some(&day(10, 27)));
    assert_eq!(dates.last(), Some(&day(11, 2)));
}

#[tokio::test]
async fn scenario_c_box_under_limit_keeps_every_cell() {
    let store = MemorySnapshotStore::new().with_snapshot(taiwan_snapshot(day(10, 30)));
    let engine = engine_over(store, EngineConfig::default());

    let params = box_params(bbox::TAIWAN);
    let result = run(&engine, &as_pairs(&params)).await.unwrap();

    assert_eq!(result.stride, Some(1));
    assert_eq!(result.row_count, 401 * 601);
    assert_eq!(result.rows.len(), result.row_count);

    // Row-major: latitude outer, longitude inner, both ascending.
    let first = &result.rows[0];
    let second = &result.rows[1];
    let next_lat = &result.rows[401];
    assert_coords_approx_eq!((first.lon, first.lat), (119.0, 20.0), 1e-9);
    assert_coords_approx_eq!((second.lon, second.lat), (119.01, 20.0), 1e-9);
    assert_coords_approx_eq!((next_lat.lon, next_lat.lat), (119.0, 20.01), 1e-9);
}

#[tokio::test]
async fn scenario_c_unordered_box_matches_sorted() {
    let store = MemorySnapshotStore::new().with_snapshot(taiwan_snapshot(day(10, 30)));
    let engine = engine_over(store, EngineConfig::default());

    let sorted = box_params(bbox::TAIWAN);
    let unordered = box_params(bbox::TAIWAN_UNORDERED);
    let mut sorted = as_pairs(&sorted);
    let mut unordered = as_pairs(&unordered);
    sorted.push(("sample", "5"));
    unordered.push(("sample", "5"));

    let a = run(&engine, &sorted).await.unwrap();
    let b = run(&engine, &unordered).await.unwrap();
    assert_eq!(a.stride, Some(5));
    assert_eq!(a.rows, b.rows);
}

#[tokio::test]
async fn scenario_d_oversized_box_fails_before_extraction() {
    // Axes only: any field read would come back null, and none should happen.
    let axes = GridAxes::new(
        axis_between(100.0, 160.0, 0.01),
        axis_between(-30.0, 30.0, 0.01),
    )
    .unwrap();
    let store = MemorySnapshotStore::new().with_snapshot(MemorySnapshot::new(day(10, 30), axes));
    let engine = engine_over(store, EngineConfig::default());

    let params = box_params(bbox::WEST_PACIFIC);
    let err = run(&engine, &as_pairs(&params)).await.unwrap_err();
    match err {
        QueryError::TooManyPoints { count, limit } => {
            assert_eq!(limit, 1_000_000);
            assert!(count > limit);
        }
        other => panic!("expected TooManyPoints, got {:?}", other),
    }
}

#[tokio::test]
async fn scenario_e_box_day_outside_bounds() {
    let store = MemorySnapshotStore::new()
        .with_snapshot(taiwan_snapshot(day(10, 27)))
        .with_snapshot(taiwan_snapshot(day(11, 2)));
    let engine = engine_over(store, EngineConfig::default());

    let mut params = box_params(bbox::TAIWAN);
    params.push(("start", "2025-11-03".to_string()));
    let err = run(&engine, &as_pairs(&params)).await.unwrap_err();
    assert!(matches!(err, QueryError::DateOutOfRange { .. }));
    assert!(err.to_string().contains("2025-10-27/2025-11-02"));
}

#[tokio::test]
async fn point_range_entirely_before_bounds() {
    let store = MemorySnapshotStore::new().with_snapshot(taiwan_snapshot(day(10, 27)));
    let engine = engine_over(store, EngineConfig::default());

    let err = run(
        &engine,
        &[
            ("lon0", "121"),
            ("lat0", "23"),
            ("start", "2024-01-01"),
            ("end", "2024-01-31"),
        ],
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("2025-10-27/2025-10-27"));
}

#[tokio::test]
async fn unknown_field_fails_the_whole_request() {
    let store = MemorySnapshotStore::new().with_snapshot(taiwan_snapshot(day(10, 27)));
    let engine = engine_over(store, EngineConfig::default());

    let err = run(
        &engine,
        &[("lon0", "121"), ("lat0", "23"), ("append", "sst,chlorophyll")],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedField { .. }));
}

#[tokio::test]
async fn empty_store_reports_no_data() {
    let engine = engine_over(MemorySnapshotStore::new(), EngineConfig::default());
    let err = run(&engine, &[("lon0", "121"), ("lat0", "23")])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NoDataAvailable));
}
