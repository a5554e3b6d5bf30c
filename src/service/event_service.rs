//! Event service: validated append and keyset-paginated listing.

use std::sync::Arc;

use crate::domain::{AuditEvent, EventId, FaultInjector, NewAuditEvent, SharedState};
use crate::error::AuditError;
use crate::persistence::postgres;
use crate::telemetry;

/// Page size used when the client does not send one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A page request: how many events and where to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of events to return; must be positive.
    pub page_size: i64,
    /// Return only events older than this id.
    pub page_token: Option<EventId>,
}

impl PageRequest {
    /// Checks that `page_size` is positive.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Validation`] for a zero or negative size.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.page_size < 1 {
            return Err(AuditError::Validation(format!(
                "page_size must be positive, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// One page of events, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    /// Events ordered by descending id.
    pub events: Vec<AuditEvent>,
    /// Id of the last event, to pass back as the next `page_token`.
    /// `None` when the page is empty.
    pub next_page: Option<EventId>,
}

impl EventPage {
    fn from_events(events: Vec<AuditEvent>) -> Self {
        let next_page = events.last().map(|e| e.event_id);
        Self { events, next_page }
    }
}

/// Orchestration layer for event operations.
///
/// Every operation follows the pattern: validate → inject fault → enter
/// read scope → transaction → leave read scope → record metrics.
#[derive(Debug, Clone)]
pub struct EventService {
    state: Arc<SharedState>,
    faults: Arc<dyn FaultInjector>,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(state: Arc<SharedState>, faults: Arc<dyn FaultInjector>) -> Self {
        Self { state, faults }
    }

    /// Inserts `events` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Validation`] for an empty batch or invalid
    /// event, [`AuditError::TransientFailure`] when a fault is injected,
    /// and a database error if the transaction fails. On any error nothing
    /// is written.
    pub async fn append(&self, events: Vec<NewAuditEvent>) -> Result<u64, AuditError> {
        if events.is_empty() {
            return Err(AuditError::Validation(
                "event batch must not be empty".to_string(),
            ));
        }
        for event in &events {
            event.validate()?;
        }

        self.faults.check()?;

        tracing::info!(count = events.len(), "inserting events");
        let inserted = {
            let scope = self.state.read().await;
            let mut tx = scope.pool.begin().await?;
            let inserted = postgres::insert_events(&mut *tx, &events).await?;
            tx.commit().await?;
            inserted
        };

        for event in &events {
            telemetry::record_event_inserted(&event.application_name);
        }
        Ok(inserted)
    }

    /// Returns one page of events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Validation`] for a non-positive page size,
    /// [`AuditError::TransientFailure`] when a fault is injected, and a
    /// database error if the query fails.
    pub async fn list(&self, request: PageRequest) -> Result<EventPage, AuditError> {
        request.validate()?;

        self.faults.check()?;

        let events = {
            let scope = self.state.read().await;
            let mut tx = scope.pool.begin().await?;
            let events =
                postgres::list_events(&mut *tx, request.page_size, request.page_token).await?;
            tx.commit().await?;
            events
        };

        Ok(EventPage::from_events(events))
    }
}
