//! Error types for the fleet manager.

use thiserror::Error;

/// Errors from fleet-wide subscription operations.
#[derive(Debug, Error)]
pub enum FleetError {
    /// One or more per-server create attempts failed. Carries every
    /// per-server failure message, in completion order, after rollback of
    /// the subscriptions that did get created.
    #[error("subscription rollout failed on {} server(s): {}", .failures.len(), .failures.join("; "))]
    Aggregate {
        /// Per-server failure messages, one per failed server
        failures: Vec<String>,
    },
}

impl FleetError {
    /// The per-server failure messages behind this error.
    pub fn failures(&self) -> &[String] {
        match self {
            Self::Aggregate { failures } => failures,
        }
    }
}

/// Result type for fleet operations.
pub type Result<T> = std::result::Result<T, FleetError>;
