//! Unauthenticated liveness endpoints and the fallback for unknown paths.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::{HealthResponse, MessageResponse};
use tracing::debug;

use crate::io::rest::error::error_response;

pub async fn health() -> impl IntoResponse {
    debug!("GET /api/v1/health");

    Json(HealthResponse {
        status: "ok".to_string(),
        message: "API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn root() -> impl IntoResponse {
    Json(MessageResponse::new("Budget API"))
}

/// JSON 404 for paths no route matches
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}
