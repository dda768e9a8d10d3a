//! Access tokens for the Reporting API.
//!
//! Two flows end up at the same [`TokenSource`]: a service account signing its
//! own assertions (server-to-server), and an access token delegated by a user.

pub mod service_account;

use async_trait::async_trait;

use crate::error::Result;

pub use service_account::{ServiceAccountKey, ServiceAccountTokenSource};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token obtained elsewhere (per-user OAuth consent). Refreshing it is the caller's job.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
