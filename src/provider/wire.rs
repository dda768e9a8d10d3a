//! Request and response bodies of the Reporting API v4 `reports:batchGet` call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::QueryDescriptor;

/// Namespace token the provider expects in front of every metric and dimension name.
pub const FIELD_NAMESPACE: &str = "ga:";

/// `pageviews` -> `ga:pageviews`. Names that already carry the namespace are left alone.
pub fn namespaced(name: &str) -> String {
    if name.starts_with(FIELD_NAMESPACE) {
        name.to_string()
    } else {
        format!("{FIELD_NAMESPACE}{name}")
    }
}

/// ReportRequest fields built from the query itself; extras may not override them.
pub const RESERVED_FIELDS: [&str; 6] = [
    "viewId",
    "dateRanges",
    "metrics",
    "dimensions",
    "orderBys",
    "pageSize",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportsRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_bys: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Caller-supplied extra fields, merged into the request object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub expression: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub order_type: String,
    pub sort_order: String,
}

impl OrderBy {
    /// Descending by value, the only ordering report queries use.
    pub fn descending(field: &str) -> Self {
        Self {
            field_name: namespaced(field),
            order_type: "VALUE".to_string(),
            sort_order: "DESCENDING".to_string(),
        }
    }
}

impl ReportRequest {
    pub fn from_query(query: &QueryDescriptor) -> Self {
        Self {
            view_id: query.view_id().to_string(),
            date_ranges: vec![DateRange {
                start_date: query.start_date().format("%Y-%m-%d").to_string(),
                end_date: query.end_date().format("%Y-%m-%d").to_string(),
            }],
            metrics: query
                .metrics()
                .iter()
                .map(|metric| Metric {
                    expression: namespaced(metric),
                    alias: metric.clone(),
                })
                .collect(),
            dimensions: query
                .dimensions()
                .iter()
                .map(|dimension| Dimension {
                    name: namespaced(dimension),
                })
                .collect(),
            order_bys: query
                .sort_by_field()
                .map(OrderBy::descending)
                .into_iter()
                .collect(),
            page_size: query.max_results(),
            extra: query
                .extra()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

impl GetReportsRequest {
    pub fn single(request: ReportRequest) -> Self {
        Self {
            report_requests: vec![request],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportsResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub column_header: ColumnHeader,
    #[serde(default)]
    pub data: ReportData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metric_header: MetricHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    #[serde(default)]
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    /// The provider omits `rows` entirely when nothing matched
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}
