use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::reports::Analytics;

use super::handlers::{get_report, health_check, list_reports, perform_query, AppState};

pub fn create_api_router(analytics: Analytics, auth_service: Arc<AuthService>) -> Router {
    let state = Arc::new(AppState { analytics });

    let protected_routes = Router::new()
        .route("/api/reports", get(list_reports))
        .route("/api/reports/{name}", get(get_report))
        .route("/api/query", post(perform_query))
        .route_layer(middleware::from_fn_with_state(auth_service, auth_middleware))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
}
