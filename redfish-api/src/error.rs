//! Error types for the redfish-api crate.

use thiserror::Error;

/// Errors from single-target Redfish operations.
///
/// Every variant carries the controller address so fleet-level aggregation
/// can name the failing server without extra bookkeeping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session establishment failed: unreachable host, TLS failure or
    /// rejected credentials.
    #[error("failed to connect to {address}: {reason}")]
    Connection {
        /// The controller address
        address: String,
        /// Underlying transport detail
        reason: String,
    },

    /// Listing active subscriptions failed.
    #[error("failed to list subscriptions on {address}: {reason}")]
    Query {
        /// The controller address
        address: String,
        /// Underlying transport detail
        reason: String,
    },

    /// Creating or deleting a subscription failed.
    #[error("subscription operation failed on {address}: {reason}")]
    Subscription {
        /// The controller address
        address: String,
        /// Underlying transport or protocol detail
        reason: String,
    },

    /// The controller advertised a version string we cannot parse.
    #[error("controller at {address} advertised unparseable Redfish version {version:?}")]
    Version {
        /// The controller address
        address: String,
        /// The offending version string
        version: String,
    },
}

/// Result type for single-target Redfish operations.
pub type Result<T> = std::result::Result<T, ApiError>;
