use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Guards the report API with a static list of keys.
pub struct AuthService {
    api_keys: Arc<Vec<String>>,
}

impl AuthService {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    pub fn validate_key(&self, key: &str) -> bool {
        // No keys configured leaves the API open
        if !self.is_enabled() {
            return true;
        }

        self.api_keys.iter().any(|k| k == key)
    }
}

pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if auth_service.validate_key(api_key) {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid or missing API key").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_when_no_keys_configured() {
        let auth = AuthService::new(Vec::new());
        assert!(!auth.is_enabled());
        assert!(auth.validate_key(""));
    }

    #[test]
    fn only_configured_keys_pass() {
        let auth = AuthService::new(vec!["secret".to_string()]);
        assert!(auth.validate_key("secret"));
        assert!(!auth.validate_key("guess"));
        assert!(!auth.validate_key(""));
    }
}
