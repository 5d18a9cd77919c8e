use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use ringback_core::ServerConfig;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{calls, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().server);

    // Phone call routes
    let phone_routes = Router::new()
        .route("/number", post(calls::start_call))
        .route("/number-nonblocking", post(calls::start_call_nonblocking))
        .route("/number/{phone_number}/execution", get(calls::get_latest_execution))
        .route("/executions/{execution_id}", get(calls::get_execution))
        .route("/executions/{execution_id}/log", get(calls::get_execution_log))
        .route("/transcript/{phone_number}", get(calls::get_transcript));

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .nest("/phone", phone_routes);

    Router::new()
        .route("/", get(handlers::root))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS for the configured origins; an empty list allows any origin.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    if config.cors_allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
