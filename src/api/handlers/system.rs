//! System endpoints: health check, configuration reload, metrics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{AuditError, ErrorResponse};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Liveness only; dependencies are not checked.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service status, version, and current timestamp. Always 200.",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `POST /reload` — Re-read configuration and swap in a new pool.
///
/// # Errors
///
/// Returns [`AuditError`] if the configuration is invalid or the new pool
/// cannot be opened; the previous pool stays in use.
#[utoipa::path(
    post,
    path = "/reload",
    tag = "System",
    summary = "Reload configuration",
    description = "Reads the YAML configuration file again, opens a new connection pool, and swaps it in once in-flight requests on the old pool finish.",
    responses(
        (status = 201, description = "Configuration reloaded"),
        (status = 500, description = "Invalid configuration", body = ErrorResponse),
        (status = 503, description = "New pool could not be opened", body = ErrorResponse),
    )
)]
pub async fn reload_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AuditError> {
    state.reload_service.reload().await?;
    Ok(StatusCode::CREATED)
}

/// `GET /metrics` — Prometheus exposition.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "System",
    summary = "Metrics",
    description = "Prometheus text exposition, including `events_inserted{application}`.",
    responses(
        (status = 200, description = "Metrics text", body = String, content_type = "text/plain"),
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// System routes mounted at the root level (not under /api).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/reload", post(reload_handler))
        .route("/metrics", get(metrics_handler))
}
