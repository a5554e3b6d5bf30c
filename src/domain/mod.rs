//! Domain layer: audit event model, shared state, and fault injection.
//!
//! This module contains the server-side domain model including event
//! identity and validation, the hot-swappable [`SharedState`] holding the
//! current [`ResourceBundle`], and the [`FaultInjector`] strategies.

pub mod audit_event;
pub mod event_id;
pub mod fault;
pub mod shared_state;

pub use audit_event::{AuditEvent, NewAuditEvent};
pub use event_id::EventId;
pub use fault::{FaultInjector, NoFaults, RandomFaultInjector};
pub use shared_state::{ReadScope, Resource, ResourceBundle, SharedState};
