//! The collaborator seam between the fleet orchestrator and the wire.
//!
//! The orchestrator only ever talks to controllers through these traits, so
//! tests can drive the full fan-out/rollback machinery without a network.
//! `HttpConnector` is the production implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EventDestination, ServerDescriptor, SubscriptionPayload};

/// A live authenticated session to one controller.
///
/// The holder owns the remote session and must call [`Session::close`] on
/// every exit path, success or failure, to avoid leaking sessions on the
/// controller.
#[async_trait]
pub trait Session: Send + Sync + std::fmt::Debug {
    /// Address of the controller this session is bound to.
    fn address(&self) -> &str;

    /// Return every active subscription on this controller.
    async fn list_subscriptions(&self) -> Result<Vec<EventDestination>>;

    /// Create a subscription and return the remote-assigned identifier.
    ///
    /// The request shape sent over the wire depends on the protocol version
    /// the controller advertised when the session was opened.
    async fn create_subscription(&self, payload: &SubscriptionPayload) -> Result<String>;

    /// Delete a subscription by its resource identifier.
    async fn delete_subscription(&self, id: &str) -> Result<()>;

    /// Release the remote session. Failures are logged, never returned;
    /// callers on error paths must still be able to close unconditionally.
    async fn close(self: Box<Self>);
}

/// Opens authenticated sessions to controllers.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session to the given server.
    async fn connect(&self, server: &ServerDescriptor) -> Result<Box<dyn Session>>;
}
