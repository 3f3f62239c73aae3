//! Authentication middleware for axum

use std::sync::Arc;

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use mockview_core::{AuthConfig, AuthContext, TokenValidator};

/// Cookie carrying the session token for browser clients
const TOKEN_COOKIE: &str = "mockview_token";

/// Query parameter carrying the token for WebSocket handshakes
const TOKEN_QUERY_PARAM: &str = "token";

/// Authentication layer state
#[derive(Clone)]
pub struct AuthLayer {
    validator: Arc<TokenValidator>,
}

impl AuthLayer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            validator: Arc::new(TokenValidator::from_config(config)),
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }
}

/// Extract a bearer token from the Authorization header, query string, or cookie
fn extract_token(request: &Request) -> Option<String> {
    if let Some(value) = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    if let Some(query) = request.uri().query() {
        for pair in query.split('&') {
            if let Some(token) = pair.strip_prefix(&format!("{TOKEN_QUERY_PARAM}=")) {
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    if let Some(cookies) = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|header| header.to_str().ok())
    {
        for cookie in cookies.split(';') {
            if let Some(value) = cookie.trim().strip_prefix(&format!("{TOKEN_COOKIE}=")) {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Authentication middleware function
pub async fn auth_middleware(
    axum::Extension(auth_layer): axum::Extension<AuthLayer>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = extract_token(&request) else {
        tracing::debug!("No token provided");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let identity = match auth_layer.validator.validate(&token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!("Token validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    request
        .extensions_mut()
        .insert(AuthContext::Authenticated { identity });

    Ok(next.run(request).await)
}
