pub mod key;
pub mod memory;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::query::FlatRow;

pub use key::derive_key;
pub use memory::MemoryCache;

/// Storage for flattened report rows, keyed by [`derive_key`].
///
/// Implementations only promise single-key atomicity; nothing here locks
/// across a get followed by a set.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<FlatRow>>>;

    /// Store `rows` for `ttl`. A zero `ttl` must not leave an entry behind.
    async fn set(&self, key: &str, rows: Vec<FlatRow>, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

impl dyn CacheStore {
    /// Return the cached rows for `key`, or run `compute` and store its result for `ttl`.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Vec<FlatRow>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Vec<FlatRow>>> + Send,
    {
        if let Some(rows) = self.get(key).await? {
            debug!("Report cache hit for {}", key);
            return Ok(rows);
        }

        debug!("Report cache miss for {}", key);
        let rows = compute().await?;

        if !ttl.is_zero() {
            self.set(key, rows.clone(), ttl).await?;
        }

        Ok(rows)
    }
}
