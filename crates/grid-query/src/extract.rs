//! Row Extractor.

use crate::error::{StoreError, StoreResult};
use crate::fields::FieldSet;
use crate::request::OutputMode;
use crate::store::Snapshot;
use crate::types::{GridIndex, GridWindow, ResultRow};

/// Read one grid cell into a row.
pub async fn extract_point(
    snapshot: &dyn Snapshot,
    index: GridIndex,
    fields: &FieldSet,
    mode: OutputMode,
) -> StoreResult<ResultRow> {
    extract_window(snapshot, &GridWindow::cell(index), fields, mode)
        .await?
        .pop()
        .ok_or_else(|| StoreError::read_failed("empty cell read"))
}

/// Read a strided window into rows, latitude outer and longitude inner.
///
/// Each field is read once for the whole window. A field the snapshot does
/// not store yields null in every row, as does any NaN cell.
pub async fn extract_window(
    snapshot: &dyn Snapshot,
    window: &GridWindow,
    fields: &FieldSet,
    mode: OutputMode,
) -> StoreResult<Vec<ResultRow>> {
    let count = window.point_count();

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields.iter() {
        let values = if snapshot.has_field(field) {
            let values = snapshot.read_window(field, window).await?;
            if values.len() != count {
                return Err(StoreError::read_failed(format!(
                    "{} returned {} values for a {}-point window",
                    field,
                    values.len(),
                    count
                )));
            }
            Some(values)
        } else {
            None
        };
        columns.push((field, values));
    }

    let axes = snapshot.axes();
    let date = snapshot.date();
    let mut rows = Vec::with_capacity(count);
    let mut k = 0;
    for j in window.lat.indices() {
        let lat = mode.coord(axes.lat()[j]);
        for i in window.lon.indices() {
            let values = columns
                .iter()
                .map(|(field, data)| {
                    let value = data
                        .as_ref()
                        .map(|d| d[k])
                        .filter(|v| !v.is_nan())
                        .map(|v| mode.value(f64::from(v)));
                    (*field, value)
                })
                .collect();
            rows.push(ResultRow {
                lon: mode.coord(axes.lon()[i]),
                lat,
                date,
                values,
            });
            k += 1;
        }
    }

    Ok(rows)
}
