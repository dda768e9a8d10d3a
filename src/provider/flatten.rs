use crate::provider::wire::{GetReportsResponse, Report};
use crate::query::FlatRow;

/// Flatten a batchGet response into one row per data row: dimension values in
/// column-header order, then every metric value of every date-range group.
///
/// Only the first report is read since each request carries a single report
/// request. A missing report flattens to an empty result.
pub fn flatten(response: &GetReportsResponse) -> Vec<FlatRow> {
    response
        .reports
        .first()
        .map(flatten_report)
        .unwrap_or_default()
}

pub fn flatten_report(report: &Report) -> Vec<FlatRow> {
    let dimension_headers = report.column_header.dimensions.len();

    report
        .data
        .rows
        .iter()
        .map(|row| {
            let dimensions = row.dimensions.iter().take(dimension_headers);
            let metrics = row.metrics.iter().flat_map(|group| group.values.iter());

            dimensions.chain(metrics).cloned().collect()
        })
        .collect()
}
