//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn, routing::get};
use tower_http::cors::CorsLayer;

use crate::middleware::{AuthLayer, auth_middleware};
use crate::ws::ws_handler;
use crate::AppState;

pub use api::{
    ApiError, ErrorResponse, HealthResponse, InterviewListResponse, InterviewSummary, ListQuery,
};

/// Create the HTTP router with all routes configured
///
/// `/api/health` is public; everything else requires a valid token.
pub fn create_router(state: Arc<AppState>, auth: AuthLayer) -> Router {
    let protected = Router::new()
        .route("/api/interviews", get(api::list_interviews))
        .route("/ws", get(ws_handler))
        .layer(from_fn(auth_middleware))
        .layer(Extension(auth));

    Router::new()
        .route("/api/health", get(api::health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
