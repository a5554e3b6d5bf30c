//! Prometheus metrics: recorder setup, HTTP middleware, and counters.

use std::fmt;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::AuditError;

/// Events inserted, labelled by `application`.
pub const EVENTS_INSERTED: &str = "events_inserted";
/// HTTP requests served, labelled by `method`, `path`, `status`.
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// HTTP request latency in seconds, labelled by `method`, `path`.
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
/// Configuration reloads, labelled by `outcome`.
pub const RELOADS_TOTAL: &str = "reloads_total";

/// Renders the exposition text for `GET /metrics`.
#[derive(Clone)]
pub struct MetricsHandle(PrometheusHandle);

impl MetricsHandle {
    /// Installs the process-wide Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Internal`] if a recorder is already installed.
    pub fn install() -> Result<Self, AuditError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| AuditError::Internal(e.to_string()))?;
        describe_metrics();
        Ok(Self(handle))
    }

    /// Builds a recorder that is not installed globally. Its output only
    /// reflects metrics recorded through it directly.
    #[must_use]
    pub fn detached() -> Self {
        Self(PrometheusBuilder::new().build_recorder().handle())
    }

    /// Current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.0.render()
    }
}

impl fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsHandle").finish_non_exhaustive()
    }
}

fn describe_metrics() {
    metrics::describe_counter!(EVENTS_INSERTED, "Number of events inserted");
    metrics::describe_counter!(HTTP_REQUESTS_TOTAL, "Number of HTTP requests served");
    metrics::describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request latency in seconds");
    metrics::describe_counter!(RELOADS_TOTAL, "Number of configuration reloads");
}

/// Counts one committed event for `application`.
pub fn record_event_inserted(application: &str) {
    metrics::increment_counter!(EVENTS_INSERTED, "application" => application.to_string());
}

/// Counts one reload attempt.
pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::increment_counter!(RELOADS_TOTAL, "outcome" => outcome);
}

/// Records request count and latency per matched route.
pub async fn track_http(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::increment_counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    );
    metrics::histogram!(
        HTTP_REQUEST_DURATION,
        started.elapsed().as_secs_f64(),
        "method" => method,
        "path" => path
    );

    response
}
