//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use sketchdrop_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router {
    // The drawing client is served from arbitrary origins, so CORS stays open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = body_limit_bytes(&state.config);

    Router::new()
        .route("/", post(handlers::submit::submit_image).options(preflight))
        .route("/health", get(handlers::health::health_check))
        // axum caps the Bytes extractor at 2 MB unless told otherwise, which
        // would reject valid submissions long before RequestBodyLimitLayer
        // ever saw them.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bare OPTIONS acknowledgement; the CORS layer attaches the actual
/// preflight headers.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Request body ceiling: the largest accepted raster as RGBA, inflated by
/// base64 (4/3), with headroom for the data URL prefix. Anything bigger
/// could never decode within the pixel ceiling anyway.
fn body_limit_bytes(config: &Config) -> usize {
    let raw = config.max_pixel_area().saturating_mul(4);
    let encoded = raw.saturating_mul(4) / 3 + 1024;
    usize::try_from(encoded).unwrap_or(usize::MAX)
}
