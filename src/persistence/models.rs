//! Database row models.

use chrono::{DateTime, Utc};

use crate::domain::{AuditEvent, EventId};
use crate::error::AuditError;

/// A raw row from the `audit_event` table.
///
/// `payload` is stored as JSON text and decoded on conversion.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    /// `bigserial` primary key.
    pub event_id: i64,
    /// Client timestamp.
    pub event_ts: DateTime<Utc>,
    /// Emitting application.
    pub application_name: String,
    /// Event category.
    pub event_kind: String,
    /// JSON text.
    pub payload: String,
}

impl From<(i64, DateTime<Utc>, String, String, String)> for StoredEvent {
    fn from(
        (event_id, event_ts, application_name, event_kind, payload): (
            i64,
            DateTime<Utc>,
            String,
            String,
            String,
        ),
    ) -> Self {
        Self {
            event_id,
            event_ts,
            application_name,
            event_kind,
            payload,
        }
    }
}

impl TryFrom<StoredEvent> for AuditEvent {
    type Error = AuditError;

    fn try_from(row: StoredEvent) -> Result<Self, Self::Error> {
        let payload = serde_json::from_str(&row.payload).map_err(|e| {
            AuditError::Database(format!("event {} has invalid payload: {e}", row.event_id))
        })?;
        Ok(Self {
            event_id: EventId::new(row.event_id),
            event_ts: row.event_ts,
            application_name: row.application_name,
            event_kind: row.event_kind,
            payload,
        })
    }
}
