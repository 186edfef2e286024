//! # fleet-manager
//!
//! Fleet-wide Redfish event-subscription orchestration with all-or-nothing
//! rollback.
//!
//! Given a list of target BMCs and one subscription payload, the
//! [`FleetManager`] creates a matching subscription on every server in
//! parallel and tracks the remote-assigned identifiers. If any server
//! fails, every subscription created so far is deleted again, so no server
//! is ever left partially subscribed. Rollback is best effort: delete
//! failures are logged and never escalated.

mod error;
mod manager;

pub use error::{FleetError, Result};
pub use manager::FleetManager;
