//! audit-server entry point.
//!
//! Loads settings, opens the initial pool, and serves the REST API until
//! Ctrl-C or SIGTERM.

use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use audit_svc::api;
use audit_svc::app_state::AppState;
use audit_svc::config::{ReloadableConfig, ServerSettings};
use audit_svc::domain::SharedState;
use audit_svc::domain::fault::injector_for_rate;
use audit_svc::telemetry::MetricsHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = ServerSettings::parse();

    // Initialize tracing
    settings.log.init();
    tracing::debug!(?settings, "settings");

    let metrics = MetricsHandle::install()?;

    // Build the initial resource bundle
    let config = ReloadableConfig::load(&settings.config).await?;
    let bundle = config.into_bundle().await?;
    let shared = Arc::new(SharedState::new(bundle));

    let app_state = AppState::new(
        Arc::clone(&shared),
        injector_for_rate(settings.fault_rate),
        settings.config.clone(),
        metrics,
    );

    // Build router
    let app: Router = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    shared.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
