//! Data Transfer Objects for REST request/response serialization.
//!
//! Append bodies are parsed straight into [`crate::domain::NewAuditEvent`];
//! only the list endpoint needs dedicated shapes.

pub mod event_dto;

pub use event_dto::*;
