//! Type-safe audit event identifier.
//!
//! [`EventId`] is a newtype wrapper around the store-assigned `bigserial`
//! so event identifiers cannot be confused with page sizes or other
//! integers. It doubles as the keyset pagination cursor.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a persisted audit event.
///
/// Assigned by the store on insert, strictly increasing in commit order.
/// Clients never choose one; they only echo it back as a `page_token`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<EventId> for i64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}
