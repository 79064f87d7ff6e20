//! Query Resolution Engine for Daily Gridded Snapshots
//!
//! This crate turns a point or bounding-box request against a time-sliced
//! lon/lat grid (one snapshot per calendar day) into a bounded, correctly
//! indexed set of rows. It enables:
//!
//! - **Nearest-neighbor lookup**: deterministic index resolution on sorted axes
//! - **Bounded box reads**: stride selection and escalation under a point ceiling
//! - **Gap-tolerant ranges**: date clamping against the available bounds,
//!   skipping days whose snapshot was never published
//!
//! # Architecture
//!
//! ```text
//! QueryRequest
//!      │
//!      ▼
//! QueryEngine::resolve
//!      │
//!      ├─► BoundsIndex::get_bounds (cached, rescanned when stale)
//!      │
//!      ├─► RangePlanner (point)  ──┐
//!      │                           ├─► SnapshotStore::open(day)
//!      ├─► BoxPlanner (box)  ──────┘          │
//!      │                                      ▼
//!      │                           resolve::resolve (nearest index)
//!      │                                      │
//!      └──────────────────────────► extract (rows, nulls for missing)
//!               │
//!               ▼
//!          QueryResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_query::{BoundsIndex, EngineConfig, QueryEngine, QueryRequest, ZarrSnapshotStore};
//!
//! let store = Arc::new(ZarrSnapshotStore::new("data/mur.zarr")?);
//! let index = Some(PathBuf::from("data/mur.zarr/latest.json"));
//! let bounds = Arc::new(BoundsIndex::new(store.clone(), index, Duration::from_secs(300)));
//! let engine = QueryEngine::new(store, bounds, EngineConfig::default());
//!
//! let request = QueryRequest::from_raw(&raw)?;
//! let result = engine.resolve(&request).await?;
//! for row in &result.rows {
//!     // ...
//! }
//! ```

pub mod bounds;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fields;
pub mod plan;
pub mod request;
pub mod resolve;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use bounds::BoundsIndex;
pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use error::{QueryError, Result, StoreError, StoreResult};
pub use fields::{Field, FieldSet};
pub use plan::{BoxPlan, BoxPlanner, RangePlanner};
pub use request::{BoxQuery, DateSelection, OutputMode, PointQuery, QueryRequest, RawQuery};
pub use store::{
    GridAxes, MemorySnapshot, MemorySnapshotStore, Snapshot, SnapshotStore, ZarrSnapshotStore,
};
pub use types::{
    BoundsRecord, FieldValue, GeoBox, GridIndex, GridWindow, IndexSpan, QueryResult, ResultRow,
};
