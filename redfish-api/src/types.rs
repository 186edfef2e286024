//! Core types for the redfish-api crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Authentication method used when opening a session to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP basic auth on every request, no remote session resource.
    Basic,
    /// Redfish session login; requests carry an `X-Auth-Token` header.
    Session,
}

/// A target BMC in a fleet operation.
///
/// Uniquely identified by `address` within one fleet operation; the
/// orchestrator looks descriptors up by address during rollback.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDescriptor {
    /// Endpoint URL of the controller, e.g. `https://10.0.12.7`
    pub address: String,
    /// Login user name
    pub username: String,
    /// Login password
    pub password: String,
    /// How to authenticate against this controller
    #[serde(rename = "loginType")]
    pub auth_method: AuthMethod,
    /// Name of the scheduling-system node backed by this controller
    #[serde(rename = "schedulerNode")]
    pub scheduler_node: String,
}

impl ServerDescriptor {
    /// Create a new server descriptor.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        auth_method: AuthMethod,
        scheduler_node: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
            auth_method,
            scheduler_node: scheduler_node.into(),
        }
    }
}

/// Redfish event categories a legacy-shape subscription can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    StatusChange,
    ResourceUpdated,
    ResourceAdded,
    ResourceRemoved,
    Alert,
}

/// Redelivery behavior the controller applies when the destination is
/// unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryRetryPolicy {
    TerminateAfterRetries,
    SuspendRetries,
    RetryForever,
}

/// Protocol the controller uses to deliver events to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventProtocol {
    Redfish,
}

impl Default for EventProtocol {
    fn default() -> Self {
        Self::Redfish
    }
}

/// The subscription to replicate across a fleet.
///
/// Constructed once by the caller and reused identically for every server.
/// `event_types` feeds the legacy request shape; `registry_prefixes`,
/// `resource_types` and `delivery_retry_policy` feed the modern shape.
/// Which set is sent depends on the version each controller advertises.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPayload {
    /// Callback URL events are pushed to; also the key for duplicate detection
    pub destination: String,
    /// Event-type filters (legacy shape)
    pub event_types: Vec<EventType>,
    /// Message-registry prefix filters (modern shape)
    pub registry_prefixes: Vec<String>,
    /// Resource-type filters (modern shape)
    pub resource_types: Vec<String>,
    /// Redelivery policy (modern shape only)
    pub delivery_retry_policy: Option<DeliveryRetryPolicy>,
    /// Custom headers the controller attaches to event deliveries
    pub http_headers: HashMap<String, String>,
    /// Vendor-extension data passed through verbatim
    pub oem: Option<serde_json::Value>,
    /// Delivery protocol tag
    pub protocol: EventProtocol,
    /// Free-form context string echoed back in every event
    pub context: String,
}

/// An active subscription as reported by a controller.
///
/// Exists only remotely; this is the shape returned by the list operation.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDestination {
    /// Opaque resource identifier assigned by the controller
    #[serde(rename = "Id", default)]
    pub id: String,
    /// Resource address, used for delete calls
    #[serde(rename = "@odata.id", default)]
    pub odata_id: String,
    /// Callback URL this subscription delivers to
    #[serde(rename = "Destination", default)]
    pub destination: String,
    /// Context string supplied at creation, if any
    #[serde(rename = "Context", default)]
    pub context: Option<String>,
}
