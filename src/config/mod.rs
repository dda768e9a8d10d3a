use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::provider::http::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub credentials: CredentialsConfig,
    pub api_server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub view_id: String,
    /// 0 disables caching: every query evicts its entry and refetches
    #[serde(default = "AnalyticsConfig::default_cache_lifetime_in_minutes")]
    pub cache_lifetime_in_minutes: u64,
    #[serde(default = "AnalyticsConfig::default_cache_max_entries")]
    pub cache_max_entries: u64,
    #[serde(default = "AnalyticsConfig::default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    ServiceAccount,
    Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub mode: AuthMode,
    /// Path to the service account key file
    #[serde(default)]
    pub service_account_credentials_json: Option<String>,
    /// Delegated user access token
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accepted `X-API-Key` values; empty leaves the API open
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl AnalyticsConfig {
    const fn default_cache_lifetime_in_minutes() -> u64 {
        60 * 24
    }

    const fn default_cache_max_entries() -> u64 {
        10_000
    }

    fn default_endpoint() -> String {
        DEFAULT_ENDPOINT.to_string()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let view_id = std::env::var("GA_VIEW_ID").context("GA_VIEW_ID must be set")?;

        let cache_lifetime_in_minutes = match std::env::var("GA_CACHE_LIFETIME_MINUTES") {
            Ok(v) => v
                .parse::<u64>()
                .context("GA_CACHE_LIFETIME_MINUTES must be a non-negative integer")?,
            Err(_) => AnalyticsConfig::default_cache_lifetime_in_minutes(),
        };

        let cache_max_entries = std::env::var("GA_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(AnalyticsConfig::default_cache_max_entries);

        let endpoint =
            std::env::var("GA_API_ENDPOINT").unwrap_or_else(|_| AnalyticsConfig::default_endpoint());

        let mode = match std::env::var("GA_AUTH_MODE")
            .unwrap_or_else(|_| "service_account".to_string())
            .to_lowercase()
            .as_str()
        {
            "service_account" | "service-account" => AuthMode::ServiceAccount,
            "token" => AuthMode::Token,
            other => {
                tracing::warn!(
                    "Unknown GA_AUTH_MODE '{other}', falling back to 'service_account'. Supported values: service_account, token"
                );
                AuthMode::ServiceAccount
            }
        };

        let service_account_credentials_json =
            std::env::var("GA_SERVICE_ACCOUNT_CREDENTIALS_JSON").ok();
        let access_token = std::env::var("GA_ACCESS_TOKEN").ok();

        match mode {
            AuthMode::ServiceAccount if service_account_credentials_json.is_none() => {
                anyhow::bail!(
                    "GA_SERVICE_ACCOUNT_CREDENTIALS_JSON must be set when GA_AUTH_MODE=service_account"
                );
            }
            AuthMode::Token if access_token.is_none() => {
                anyhow::bail!("GA_ACCESS_TOKEN must be set when GA_AUTH_MODE=token");
            }
            _ => {}
        }

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let api_keys = std::env::var("API_KEYS")
            .map(|keys| parse_list(&keys))
            .unwrap_or_default();

        Ok(Config {
            analytics: AnalyticsConfig {
                view_id,
                cache_lifetime_in_minutes,
                cache_max_entries,
                endpoint,
            },
            credentials: CredentialsConfig {
                mode,
                service_account_credentials_json,
                access_token,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
                api_keys,
            },
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
