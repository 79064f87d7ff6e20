//! Request metrics.
//!
//! Recorded through the `metrics` facade; the binary installs the Prometheus
//! recorder and `/metrics` renders it. Without a recorder these are no-ops.

use metrics::{counter, histogram};

/// Count an accepted request by mode (`point`, `point-range`, `box`).
pub fn record_request(mode: &'static str) {
    counter!("ghrsst_requests_total", "mode" => mode).increment(1);
}

/// Count a failed request by error kind.
pub fn record_error(kind: &'static str) {
    counter!("ghrsst_request_errors_total", "kind" => kind).increment(1);
}

/// Record a served response.
pub fn record_served(rows: usize, duration_ms: f64) {
    counter!("ghrsst_rows_served").increment(rows as u64);
    histogram!("ghrsst_request_duration_ms").record(duration_ms);
}
