use std::sync::Arc;

use anyhow::Context;

use crate::cache::{CacheStore, MemoryCache};
use crate::client::AnalyticsClient;
use crate::config::{AnalyticsConfig, AuthMode, Config};
use crate::credentials::{ServiceAccountTokenSource, StaticTokenSource, TokenSource};
use crate::provider::HttpReportingService;

/// Builds [`AnalyticsClient`]s for either credential flow.
pub struct AnalyticsClientFactory;

impl AnalyticsClientFactory {
    /// Server-to-server flow, or the token flow when the config asks for it.
    pub fn create_for_config(config: &Config) -> anyhow::Result<AnalyticsClient> {
        let tokens: Arc<dyn TokenSource> = match config.credentials.mode {
            AuthMode::ServiceAccount => {
                let path = config
                    .credentials
                    .service_account_credentials_json
                    .as_deref()
                    .context("no service account credentials configured")?;
                Arc::new(ServiceAccountTokenSource::from_file(path)?)
            }
            AuthMode::Token => {
                let token = config
                    .credentials
                    .access_token
                    .as_deref()
                    .context("no access token configured")?;
                Arc::new(StaticTokenSource::new(token))
            }
        };

        Self::create_analytics_client(&config.analytics, tokens)
    }

    /// Per-user delegated flow with an already-issued access token.
    pub fn create_for_token(
        config: &Config,
        access_token: impl Into<String>,
    ) -> anyhow::Result<AnalyticsClient> {
        Self::create_analytics_client(
            &config.analytics,
            Arc::new(StaticTokenSource::new(access_token)),
        )
    }

    fn create_analytics_client(
        config: &AnalyticsConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> anyhow::Result<AnalyticsClient> {
        let service = Arc::new(HttpReportingService::new(config.endpoint.clone(), tokens)?);
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(config.cache_max_entries));

        Ok(AnalyticsClient::new(service, cache)
            .with_cache_lifetime_in_minutes(config.cache_lifetime_in_minutes))
    }
}
