//! Event ingestion and listing handlers.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ListEventsQuery, ListEventsResponse};
use crate::app_state::AppState;
use crate::domain::NewAuditEvent;
use crate::domain::audit_event::parse_batch;
use crate::error::{AuditError, ErrorResponse};
use crate::service::PageRequest;

/// `GET /api/event` — List events, newest first, with keyset pagination.
///
/// # Errors
///
/// Returns [`AuditError::Validation`] on malformed query parameters and a
/// server error on injected faults or database failures.
#[utoipa::path(
    get,
    path = "/api/event",
    tag = "Events",
    summary = "List events",
    description = "Returns up to `page_size` events ordered by id descending. Pass the previous response's `next_page` as `page_token` to fetch older events.",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "One page of events", body = ListEventsResponse),
        (status = 422, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Transient failure", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AuditError> {
    let Query(query) = query.map_err(|e| AuditError::Validation(e.body_text()))?;
    let request = PageRequest::from(query);

    let page = state.event_service.list(request).await?;

    Ok(Json(ListEventsResponse {
        next_page: page.next_page,
        page_size: request.page_size,
        data: page.events,
    }))
}

/// `POST /api/event` — Append a batch of events atomically.
///
/// # Errors
///
/// Returns [`AuditError::Validation`] on a malformed body and a server
/// error on injected faults or database failures.
#[utoipa::path(
    post,
    path = "/api/event",
    tag = "Events",
    summary = "Append events",
    description = "Inserts a non-empty JSON array of events in one transaction. Either all events are stored or none.",
    request_body(content = Vec<NewAuditEvent>, content_type = "application/json"),
    responses(
        (status = 201, description = "Events stored"),
        (status = 422, description = "Invalid body", body = ErrorResponse),
        (status = 500, description = "Transient failure", body = ErrorResponse),
    )
)]
pub async fn append_events(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AuditError> {
    let events = parse_batch(&body)?;
    state.event_service.append(events).await?;
    Ok(StatusCode::CREATED)
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/event", get(list_events).post(append_events))
}
