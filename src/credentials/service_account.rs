use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::credentials::{TokenSource, ANALYTICS_READONLY_SCOPE};
use crate::error::{AnalyticsError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before the provider says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The subset of a Google service-account key file this crate needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "ServiceAccountKey::default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    fn default_token_uri() -> String {
        DEFAULT_TOKEN_URI.to_string()
    }

    pub fn from_file(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service account key at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse service account key at {}", path.display()))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    assertion: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "TokenResponse::default_expires_in")]
    expires_in: u64,
}

impl TokenResponse {
    const fn default_expires_in() -> u64 {
        3600
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// Server-to-server flow: signs an RS256 assertion with the service account's
/// private key and trades it for an access token.
#[derive(Clone)]
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    signing_key: Arc<EncodingKey>,
    client: Client,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey) -> AnyResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("service account private key is not a valid RSA PEM")?;

        let client = Client::builder()
            .user_agent("ganalytics-token-source/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client for token exchange")?;

        Ok(Self {
            key,
            signing_key: Arc::new(signing_key),
            client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> AnyResult<Self> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }

    fn sign_assertion(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: ANALYTICS_READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.signing_key)
            .map_err(|e| AnalyticsError::remote(None, format!("failed to sign assertion: {e}")))
    }

    async fn refresh_token(&self) -> Result<CachedToken> {
        let assertion = self.sign_assertion()?;

        debug!("Exchanging service account assertion for {}", self.key.client_email);
        let response = self
            .client
            .post(&self.key.token_uri)
            .json(&TokenRequest {
                grant_type: JWT_BEARER_GRANT,
                assertion: &assertion,
            })
            .send()
            .await
            .map_err(|e| AnalyticsError::remote(None, format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token endpoint returned {}: {}", status, body);
            return Err(AnalyticsError::remote(
                Some(status.as_u16()),
                format!("token exchange rejected: {body}"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AnalyticsError::remote(Some(status.as_u16()), format!("invalid token response: {e}"))
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            value: token.access_token,
            refresh_after: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref() {
                if Instant::now() < cached.refresh_after {
                    return Ok(cached.value.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.refresh_after {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.refresh_token().await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }
}
