//! Event DTOs for the list endpoint.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AuditEvent, EventId};
use crate::service::PageRequest;
use crate::service::event_service::DEFAULT_PAGE_SIZE;

/// Query parameters for `GET /api/event`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEventsQuery {
    /// Number of events per page. Defaults to 10.
    #[serde(default = "default_page_size")]
    #[param(minimum = 1)]
    pub page_size: i64,
    /// Cursor from a previous response's `next_page`.
    #[serde(default)]
    pub page_token: Option<i64>,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl From<ListEventsQuery> for PageRequest {
    fn from(query: ListEventsQuery) -> Self {
        Self {
            page_size: query.page_size,
            page_token: query.page_token.map(EventId::new),
        }
    }
}

/// Response body for `GET /api/event`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListEventsResponse {
    /// Cursor for the next page; `null` when this page is empty.
    pub next_page: Option<EventId>,
    /// Page size that was applied.
    pub page_size: i64,
    /// Events, newest first.
    pub data: Vec<AuditEvent>,
}
