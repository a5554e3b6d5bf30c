//! Lifecycle wrapper around `sqlx::PgPool`.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::config::PostgresSettings;
use crate::error::AuditError;

/// Owns one PostgreSQL connection pool, or nothing once closed.
///
/// [`DatabasePool::close`] is idempotent. Callers must not race other
/// operations against `close`; [`crate::domain::SharedState`] provides
/// that exclusion.
#[derive(Debug, Default)]
pub struct DatabasePool {
    pool: Option<PgPool>,
}

impl DatabasePool {
    /// Opens a pool and waits for its first live connection.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ResourceUnavailable`] if the database cannot
    /// be reached or the pool comes back closed.
    pub async fn open(settings: &PostgresSettings) -> Result<Self, AuditError> {
        let pool = pool_options(settings)
            .connect(&settings.dsn)
            .await
            .map_err(|e| AuditError::ResourceUnavailable(e.to_string()))?;

        if pool.is_closed() {
            return Err(AuditError::ResourceUnavailable(
                "postgres pool is not initialized".to_string(),
            ));
        }

        tracing::info!(
            min_connections = settings.min_connections,
            max_connections = settings.max_connections,
            "postgres pool opened"
        );
        Ok(Self { pool: Some(pool) })
    }

    /// Builds a pool that connects on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Config`] if the DSN cannot be parsed.
    pub fn open_lazy(settings: &PostgresSettings) -> Result<Self, AuditError> {
        let pool = pool_options(settings)
            .connect_lazy(&settings.dsn)
            .map_err(|e| AuditError::Config(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Whether the pool is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pool.as_ref().is_some_and(|p| !p.is_closed())
    }

    /// Checks out one connection; it returns to the pool on drop.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ResourceUnavailable`] if the pool is closed
    /// or no connection could be obtained.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, AuditError> {
        Ok(self.inner()?.acquire().await?)
    }

    /// Starts a transaction on a pooled connection. Dropping it without
    /// commit rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ResourceUnavailable`] if the pool is closed
    /// or the connection fails.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, AuditError> {
        Ok(self.inner()?.begin().await?)
    }

    /// Closes the pool, waiting for checked-out connections to return.
    /// A no-op when already closed or never opened.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("postgres pool closed");
        }
    }

    fn inner(&self) -> Result<&PgPool, AuditError> {
        self.pool
            .as_ref()
            .ok_or_else(|| AuditError::ResourceUnavailable("postgres pool is closed".to_string()))
    }
}

fn pool_options(settings: &PostgresSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(settings.min_connections)
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
}
