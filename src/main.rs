use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ganalytics::api;
use ganalytics::auth::AuthService;
use ganalytics::config::{AuthMode, Config};
use ganalytics::{Analytics, AnalyticsClientFactory};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration for view {}", config.analytics.view_id);

    match config.credentials.mode {
        AuthMode::ServiceAccount => info!("🔐 Using service account credentials"),
        AuthMode::Token => info!("🔐 Using delegated access token"),
    }

    if config.analytics.cache_lifetime_in_minutes == 0 {
        info!("Report caching is disabled - every request reaches the Reporting API");
    } else {
        info!(
            "Caching reports for {} minutes (max {} entries)",
            config.analytics.cache_lifetime_in_minutes, config.analytics.cache_max_entries
        );
    }

    let client = AnalyticsClientFactory::create_for_config(&config)?;
    let analytics = Analytics::new(client, config.analytics.view_id.clone());

    let auth_service = Arc::new(AuthService::new(config.api_server.api_keys.clone()));
    if auth_service.is_enabled() {
        info!("🔐 API key authentication enabled");
    } else {
        info!("🔓 Authentication is disabled - all API requests are allowed");
    }

    let router = api::create_api_router(analytics, auth_service);

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 API server listening on http://{}", addr);
    info!("   - Reports available at http://{}/api/reports/{{name}}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
