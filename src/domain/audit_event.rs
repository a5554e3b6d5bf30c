//! Audit event model and batch validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::EventId;
use crate::error::AuditError;

/// Upper bound on `application_name`, counted in characters.
pub const MAX_APPLICATION_NAME_LEN: usize = 126;

/// An event as submitted by a client, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewAuditEvent {
    /// Client-supplied timestamp (RFC 3339 with offset).
    pub event_ts: DateTime<Utc>,
    /// Emitting application, at most 126 characters.
    pub application_name: String,
    /// Free-form category such as `"UserLogin"`.
    pub event_kind: String,
    /// Arbitrary structured data. Required, `null` allowed.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl NewAuditEvent {
    /// Checks field-level constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Validation`] if `application_name` is longer
    /// than [`MAX_APPLICATION_NAME_LEN`] characters.
    pub fn validate(&self) -> Result<(), AuditError> {
        let len = self.application_name.chars().count();
        if len > MAX_APPLICATION_NAME_LEN {
            return Err(AuditError::Validation(format!(
                "application_name has {len} characters, at most {MAX_APPLICATION_NAME_LEN} allowed"
            )));
        }
        Ok(())
    }
}

/// A persisted audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Store-assigned identifier, also the pagination cursor.
    pub event_id: EventId,
    /// Client-supplied timestamp.
    pub event_ts: DateTime<Utc>,
    /// Emitting application.
    pub application_name: String,
    /// Event category.
    pub event_kind: String,
    /// Structured payload decoded from storage.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

/// Parses and validates a raw `POST /api/event` body.
///
/// The body must be a non-empty JSON array of [`NewAuditEvent`] objects.
/// Content type is not inspected.
///
/// # Errors
///
/// Returns [`AuditError::Validation`] on malformed JSON, missing or
/// mistyped fields, an empty batch, or an over-long application name.
pub fn parse_batch(body: &[u8]) -> Result<Vec<NewAuditEvent>, AuditError> {
    let events: Vec<NewAuditEvent> =
        serde_json::from_slice(body).map_err(|e| AuditError::Validation(e.to_string()))?;

    if events.is_empty() {
        return Err(AuditError::Validation(
            "event batch must not be empty".to_string(),
        ));
    }

    for (index, event) in events.iter().enumerate() {
        event.validate().map_err(|e| match e {
            AuditError::Validation(msg) => AuditError::Validation(format!("event {index}: {msg}")),
            other => other,
        })?;
    }

    Ok(events)
}
