use axum::{extract::State, http::header, response::IntoResponse, Json};
use ringback_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

/// Plain-text banner served at `/`.
pub const BANNER: &str = "Voice AI backend is up";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn root() -> &'static str {
    BANNER
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
