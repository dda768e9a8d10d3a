use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::query::FlatRow;

#[derive(Clone)]
struct CachedReport {
    rows: Arc<Vec<FlatRow>>,
    ttl: Duration,
}

/// Expires each entry after the lifetime it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedReport> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedReport,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedReport,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process report cache (Moka cache)
#[derive(Clone)]
pub struct MemoryCache {
    reports: Cache<String, CachedReport>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let reports = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { reports }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<FlatRow>>> {
        Ok(self
            .reports
            .get(key)
            .await
            .map(|cached| cached.rows.as_ref().clone()))
    }

    async fn set(&self, key: &str, rows: Vec<FlatRow>, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            self.reports.invalidate(key).await;
            return Ok(());
        }

        self.reports
            .insert(
                key.to_string(),
                CachedReport {
                    rows: Arc::new(rows),
                    ttl,
                },
            )
            .await;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.reports.invalidate(key).await;
        Ok(())
    }
}
