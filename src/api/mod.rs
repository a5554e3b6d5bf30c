//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Event endpoints are mounted under `/api`; system endpoints at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::middleware;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::telemetry;

/// OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "audit-svc", description = "Audit event ingestion and retrieval"),
    paths(
        handlers::event::list_events,
        handlers::event::append_events,
        handlers::system::health_handler,
        handlers::system::reload_handler,
        handlers::system::metrics_handler,
    ),
    components(schemas(
        crate::domain::AuditEvent,
        crate::domain::NewAuditEvent,
        crate::domain::EventId,
        dto::ListEventsResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Events", description = "Audit event ingestion and listing"),
        (name = "System", description = "Health, reload, and metrics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router.layer(middleware::from_fn(telemetry::track_http))
}
