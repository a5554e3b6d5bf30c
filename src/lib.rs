//! # audit-svc
//!
//! Audit event ingestion and retrieval over HTTP, backed by PostgreSQL,
//! with configuration reload that never interrupts in-flight requests.
//!
//! Request handlers borrow the current connection pool through
//! [`domain::SharedState`]. A reload builds a complete new
//! [`domain::ResourceBundle`] first, then swaps it in under a fair
//! writer lock and closes the old pool once its last reader has left.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventService / ReloadService (service/)
//!     ├── FaultInjector (domain/)
//!     │
//!     ├── SharedState ── ResourceBundle (domain/)
//!     │
//!     └── DatabasePool + statements (persistence/) ── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod telemetry;
