//! Configuration reload: rebuild the resource bundle and swap it in.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ReloadableConfig;
use crate::domain::SharedState;
use crate::error::AuditError;
use crate::telemetry;

/// Re-reads the YAML configuration and installs a fresh bundle.
///
/// The bundle is always rebuilt, even when the configuration is
/// unchanged. If reading the file or opening the pool fails, the current
/// bundle stays installed.
#[derive(Debug, Clone)]
pub struct ReloadService {
    state: Arc<SharedState>,
    config_path: PathBuf,
}

impl ReloadService {
    /// Creates a reloader for the configuration file at `config_path`.
    #[must_use]
    pub fn new(state: Arc<SharedState>, config_path: PathBuf) -> Self {
        Self { state, config_path }
    }

    /// Loads the configuration, opens a new pool, and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Config`] if the file is unreadable or invalid
    /// and [`AuditError::ResourceUnavailable`] if the new pool cannot be
    /// opened. In both cases the shared state is untouched.
    pub async fn reload(&self) -> Result<(), AuditError> {
        tracing::info!(path = %self.config_path.display(), "configuration reload");

        let result = self.rebuild().await;
        telemetry::record_reload(result.is_ok());
        if let Err(err) = &result {
            tracing::warn!(error = %err, "configuration reload failed; keeping current pool");
        }
        result
    }

    async fn rebuild(&self) -> Result<(), AuditError> {
        let config = ReloadableConfig::load(&self.config_path).await?;
        tracing::debug!(
            max_connections = config.postgres.max_connections,
            min_connections = config.postgres.min_connections,
            "new configuration"
        );

        let bundle = config.into_bundle().await?;
        self.state.write(bundle).await;

        tracing::info!("configuration reloaded");
        Ok(())
    }
}
