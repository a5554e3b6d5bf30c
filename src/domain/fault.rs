//! Probabilistic failure injection for resilience testing.
//!
//! Handlers call [`FaultInjector::check`] after validation and before any
//! database work, so a tripped fault never leaves a partial write behind.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::error::AuditError;

/// Default probability of a simulated fault per request.
pub const DEFAULT_FAULT_RATE: f64 = 0.1;

/// Decides whether the current operation should fail.
pub trait FaultInjector: Send + Sync + fmt::Debug {
    /// Returns `Ok(())` to proceed or a transient error to abort.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::TransientFailure`] when a fault is injected.
    fn check(&self) -> Result<(), AuditError>;
}

/// Fails with a fixed probability using the thread-local RNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomFaultInjector {
    rate: f64,
}

impl RandomFaultInjector {
    /// Creates an injector failing with probability `rate`, clamped to
    /// `[0, 1]`.
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    /// Configured fault probability.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether a uniform draw in `[0, 1)` trips the fault.
    #[must_use]
    pub fn trips(&self, draw: f64) -> bool {
        draw < self.rate
    }
}

impl Default for RandomFaultInjector {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_RATE)
    }
}

impl FaultInjector for RandomFaultInjector {
    fn check(&self) -> Result<(), AuditError> {
        let draw: f64 = rand::rng().random();
        if self.trips(draw) {
            return Err(AuditError::TransientFailure("random failure".to_string()));
        }
        Ok(())
    }
}

/// Never fails. Used when injection is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn check(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl FaultInjector for AlwaysFail {
    fn check(&self) -> Result<(), AuditError> {
        Err(AuditError::TransientFailure("injected failure".to_string()))
    }
}

/// Builds the injector for a configured rate. A rate of zero or below
/// disables injection entirely.
#[must_use]
pub fn injector_for_rate(rate: f64) -> Arc<dyn FaultInjector> {
    if rate <= 0.0 {
        Arc::new(NoFaults)
    } else {
        Arc::new(RandomFaultInjector::new(rate))
    }
}
