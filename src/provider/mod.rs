//! Reporting API boundary: wire model, transport and response flattening.

pub mod flatten;
pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::error::Result;

pub use flatten::flatten;
pub use http::HttpReportingService;
pub use wire::{GetReportsRequest, GetReportsResponse, ReportRequest};

/// Authenticated handle on the reporting service.
///
/// This is also what [`crate::client::AnalyticsClient::service`] hands out, so
/// callers can issue report requests this crate has no recipe for.
#[async_trait]
pub trait ReportingService: Send + Sync {
    async fn batch_get(&self, request: &GetReportsRequest) -> Result<GetReportsResponse>;
}
