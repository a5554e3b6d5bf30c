//! Persistence layer: PostgreSQL pool lifecycle, event statements, and
//! schema migrations.
//!
//! [`DatabasePool`] owns a `sqlx::PgPool`; the statement functions in
//! [`postgres`] run on a caller-supplied connection so the service layer
//! decides transaction boundaries.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod postgres;

pub use pool::DatabasePool;
