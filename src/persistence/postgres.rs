//! PostgreSQL statements for the `audit_event` table.
//!
//! Every function runs on a caller-supplied connection so the caller owns
//! the transaction boundary.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::models::StoredEvent;
use crate::domain::{AuditEvent, EventId, NewAuditEvent};
use crate::error::AuditError;

/// Rows per multi-row `INSERT`; four binds each stays well under the
/// protocol's 65 535 parameter limit.
pub const INSERT_CHUNK: usize = 1_000;

type EventTuple = (i64, DateTime<Utc>, String, String, String);

/// Inserts `events` in order. The caller commits.
///
/// # Errors
///
/// Returns [`AuditError::Database`] or [`AuditError::ResourceUnavailable`]
/// on database failure.
pub async fn insert_events(
    conn: &mut PgConnection,
    events: &[NewAuditEvent],
) -> Result<u64, AuditError> {
    let mut inserted = 0;
    for chunk in events.chunks(INSERT_CHUNK) {
        let payloads = chunk
            .iter()
            .map(|e| serde_json::to_string(&e.payload))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuditError::Internal(e.to_string()))?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO audit_event (event_ts, application_name, event_kind, payload) ",
        );
        builder.push_values(chunk.iter().zip(payloads), |mut row, (event, payload)| {
            row.push_bind(event.event_ts)
                .push_bind(&event.application_name)
                .push_bind(&event.event_kind)
                .push_bind(payload);
        });

        let result = builder.build().execute(&mut *conn).await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Loads up to `page_size` events, newest first. With a `page_token`,
/// only events whose id is strictly below it are returned.
///
/// # Errors
///
/// Returns [`AuditError::Database`] on query failure or a corrupt payload.
pub async fn list_events(
    conn: &mut PgConnection,
    page_size: i64,
    page_token: Option<EventId>,
) -> Result<Vec<AuditEvent>, AuditError> {
    let rows = if let Some(token) = page_token {
        sqlx::query_as::<_, EventTuple>(
            "SELECT event_id, event_ts, application_name, event_kind, payload \
             FROM audit_event WHERE event_id < $2 ORDER BY event_id DESC LIMIT $1",
        )
        .bind(page_size)
        .bind(token.get())
        .fetch_all(&mut *conn)
        .await
    } else {
        sqlx::query_as::<_, EventTuple>(
            "SELECT event_id, event_ts, application_name, event_kind, payload \
             FROM audit_event ORDER BY event_id DESC LIMIT $1",
        )
        .bind(page_size)
        .fetch_all(&mut *conn)
        .await
    }?;

    rows.into_iter()
        .map(|row| AuditEvent::try_from(StoredEvent::from(row)))
        .collect()
}
