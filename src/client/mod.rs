pub mod factory;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{derive_key, CacheStore};
use crate::error::Result;
use crate::provider::wire::{GetReportsRequest, ReportRequest};
use crate::provider::{flatten, ReportingService};
use crate::query::{FlatRow, QueryDescriptor};

pub use factory::AnalyticsClientFactory;

/// Runs report queries against the provider, reading through the cache.
#[derive(Clone)]
pub struct AnalyticsClient {
    service: Arc<dyn ReportingService>,
    cache: Arc<dyn CacheStore>,
    cache_lifetime: Duration,
}

impl AnalyticsClient {
    /// Caching starts disabled (lifetime 0) until a lifetime is configured.
    pub fn new(service: Arc<dyn ReportingService>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            service,
            cache,
            cache_lifetime: Duration::ZERO,
        }
    }

    pub fn set_cache_lifetime_in_minutes(&mut self, minutes: u64) -> &mut Self {
        self.cache_lifetime = Duration::from_secs(minutes.saturating_mul(60));
        self
    }

    pub fn with_cache_lifetime_in_minutes(mut self, minutes: u64) -> Self {
        self.set_cache_lifetime_in_minutes(minutes);
        self
    }

    pub fn cache_lifetime(&self) -> Duration {
        self.cache_lifetime
    }

    /// Flattened rows for `query`, served from cache when possible.
    ///
    /// With a zero lifetime the entry is evicted first, so every call reaches
    /// the provider while still going through the same cache path.
    pub async fn perform_query(&self, query: &QueryDescriptor) -> Result<Vec<FlatRow>> {
        let key = derive_key(query);

        if self.cache_lifetime.is_zero() {
            debug!("Caching disabled, evicting {}", key);
            self.cache.delete(&key).await?;
        }

        let body = GetReportsRequest::single(ReportRequest::from_query(query));
        let service = Arc::clone(&self.service);

        self.cache
            .get_or_compute(&key, self.cache_lifetime, || async move {
                let response = service.batch_get(&body).await?;
                let rows = flatten(&response);
                info!(
                    "Fetched {} rows for view {} ({} to {})",
                    rows.len(),
                    query.view_id(),
                    query.start_date(),
                    query.end_date()
                );
                Ok(rows)
            })
            .await
    }

    /// The underlying reporting handle, for requests without a recipe here.
    pub fn service(&self) -> Arc<dyn ReportingService> {
        Arc::clone(&self.service)
    }
}
