use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::credentials::TokenSource;
use crate::error::{AnalyticsError, Result};
use crate::provider::wire::{GetReportsRequest, GetReportsResponse};
use crate::provider::ReportingService;

pub const DEFAULT_ENDPOINT: &str = "https://analyticsreporting.googleapis.com/v4/reports:batchGet";

/// Reporting API over HTTPS, authenticated with a bearer token per request.
pub struct HttpReportingService {
    client: Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpReportingService {
    pub fn new(endpoint: impl Into<String>, tokens: Arc<dyn TokenSource>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("ganalytics/0.1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client for the Reporting API")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            tokens,
        })
    }
}

#[async_trait]
impl ReportingService for HttpReportingService {
    async fn batch_get(&self, request: &GetReportsRequest) -> Result<GetReportsResponse> {
        let token = self.tokens.access_token().await?;

        debug!("Sending reports:batchGet to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalyticsError::remote(None, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = provider_error_message(&body).unwrap_or(body);
            warn!("Reporting API returned {}: {}", status, message);
            return Err(AnalyticsError::remote(Some(status.as_u16()), message));
        }

        response.json::<GetReportsResponse>().await.map_err(|e| {
            AnalyticsError::remote(Some(status.as_u16()), format!("invalid response body: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Google APIs wrap failures as `{"error": {"code": .., "message": .., "status": ..}}`.
fn provider_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}
