//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{FaultInjector, SharedState};
use crate::service::{EventService, ReloadService};
use crate::telemetry::MetricsHandle;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event append and listing.
    pub event_service: Arc<EventService>,
    /// Configuration reload.
    pub reload_service: Arc<ReloadService>,
    /// Prometheus exposition for `GET /metrics`.
    pub metrics: MetricsHandle,
}

impl AppState {
    /// Wires both services to the same shared state.
    #[must_use]
    pub fn new(
        shared: Arc<SharedState>,
        faults: Arc<dyn FaultInjector>,
        config_path: PathBuf,
        metrics: MetricsHandle,
    ) -> Self {
        Self {
            event_service: Arc::new(EventService::new(Arc::clone(&shared), faults)),
            reload_service: Arc::new(ReloadService::new(shared, config_path)),
            metrics,
        }
    }
}
