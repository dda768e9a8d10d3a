use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AnalyticsError;
use crate::period::PeriodSelector;
use crate::query::{Extras, FlatRow};
use crate::reports::{Analytics, Report, ReportKind};

pub struct AppState {
    pub analytics: Analytics,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: AnalyticsError) -> ApiError {
    let status = match &err {
        AnalyticsError::InvalidRange { .. }
        | AnalyticsError::InvalidPeriod(_)
        | AnalyticsError::EmptyMetrics
        | AnalyticsError::ReservedExtraField(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::UnknownReport(_) => StatusCode::NOT_FOUND,
        AnalyticsError::RemoteQuery { .. } | AnalyticsError::MalformedRow { .. } => {
            StatusCode::BAD_GATEWAY
        }
        AnalyticsError::CacheBackend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Report request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Query string of `GET /api/reports/{name}`
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub period: Option<String>,
    pub days: Option<u32>,
    pub months: Option<u32>,
    pub years: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub max_results: Option<u32>,
}

impl ReportParams {
    fn selector(&self) -> PeriodSelector {
        PeriodSelector {
            period: self.period.clone(),
            days: self.days,
            months: self.months,
            years: self.years,
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: &'static str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data: Report,
}

/// Run a named report
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    let kind: ReportKind = name.parse().map_err(error_response)?;
    let period = params.selector().resolve().map_err(error_response)?;

    let data = state
        .analytics
        .fetch_report(kind, period, params.max_results)
        .await
        .map_err(error_response)?;

    Ok(Json(ReportResponse {
        report: kind.name(),
        start_date: period.start_date(),
        end_date: period.end_date(),
        data,
    }))
}

/// List the names accepted by `get_report`
pub async fn list_reports() -> Json<Vec<&'static str>> {
    Json(ReportKind::ALL.iter().map(|kind| kind.name()).collect())
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub period: PeriodSelector,
    pub metrics: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub extra: Extras,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub rows: Vec<FlatRow>,
    pub total: usize,
}

/// Raw query returning flattened rows
pub async fn perform_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let period = payload.period.resolve().map_err(error_response)?;

    let rows = state
        .analytics
        .perform_query(
            period,
            payload.metrics,
            payload.dimensions,
            payload.sort_by.as_deref(),
            payload.max_results,
            payload.extra,
        )
        .await
        .map_err(error_response)?;

    let total = rows.len();
    Ok(Json(QueryResponse { rows, total }))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
