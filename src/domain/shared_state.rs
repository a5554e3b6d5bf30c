//! Hot-swappable holder for the current resource bundle.
//!
//! [`SharedState`] keeps exactly one bundle behind a
//! [`tokio::sync::RwLock`]. Tokio's lock is fair: acquisitions are granted
//! in FIFO order, so once a writer is queued no later reader is admitted
//! ahead of it, while readers already inside their scope run to completion
//! before the writer proceeds.
//!
//! # Concurrency
//!
//! - Request handlers hold a [`ReadScope`] for the whole transaction.
//! - A reload swaps the bundle under the write lock and closes the old one
//!   once the lock is released. No reader can still be using it.
//! - Dropping a [`ReadScope`] releases the lock on every exit path,
//!   including task cancellation.

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::AuditError;
use crate::persistence::DatabasePool;

/// Something owned by [`SharedState`] that must be closed when retired.
pub trait Resource: Send + Sync {
    /// Releases the underlying handles. Must tolerate repeated calls.
    ///
    /// # Errors
    ///
    /// Implementations return an error when cleanup fails; the holder
    /// logs it and carries on.
    fn close(&mut self) -> impl Future<Output = Result<(), AuditError>> + Send;
}

/// Resources derived from the current configuration.
#[derive(Debug)]
pub struct ResourceBundle {
    /// PostgreSQL connection pool.
    pub pool: DatabasePool,
}

impl ResourceBundle {
    /// Wraps an opened pool.
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl Resource for ResourceBundle {
    async fn close(&mut self) -> Result<(), AuditError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Borrow of the current bundle, valid until dropped.
pub type ReadScope<'a, B> = RwLockReadGuard<'a, B>;

/// Single point of truth for the bundle requests should use right now.
#[derive(Debug)]
pub struct SharedState<B: Resource = ResourceBundle> {
    current: RwLock<B>,
}

impl<B: Resource> SharedState<B> {
    /// Installs `bundle` as the initial current bundle.
    #[must_use]
    pub fn new(bundle: B) -> Self {
        Self {
            current: RwLock::new(bundle),
        }
    }

    /// Acquires a shared scope over the current bundle.
    ///
    /// Waits behind any writer that queued earlier.
    pub async fn read(&self) -> ReadScope<'_, B> {
        self.current.read().await
    }

    /// Swaps in `bundle` and closes the one it replaces.
    ///
    /// Waits for all current readers to leave. Readers that arrive after
    /// this call returns see `bundle`. A failure closing the outgoing
    /// bundle is logged, not returned.
    pub async fn write(&self, bundle: B) {
        let mut retired = {
            let mut guard = self.current.write().await;
            std::mem::replace(&mut *guard, bundle)
        };

        if let Err(err) = retired.close().await {
            tracing::warn!(error = %err, "failed to close retired resource bundle");
        }
    }

    /// Closes the current bundle under the exclusive lock.
    ///
    /// Safe to call more than once. Reading after close is a programmer
    /// error; the pool rejects further acquisitions.
    pub async fn close(&self) {
        let mut guard = self.current.write().await;
        if let Err(err) = guard.close().await {
            tracing::warn!(error = %err, "failed to close resource bundle");
        }
    }
}
