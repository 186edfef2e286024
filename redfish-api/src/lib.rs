//! # redfish-api
//!
//! A typed client for the Redfish event-subscription API of a single BMC.
//!
//! The crate exposes two layers: the [`Connector`]/[`Session`] traits that
//! higher-level orchestration is written against, and [`HttpConnector`], the
//! reqwest-backed implementation that speaks the protocol over the wire.
//! Request shaping is version-dependent: controllers advertising Redfish
//! 1.5 or newer receive registry/resource-type filters, older controllers
//! receive event-type filters.

mod client;
mod error;
mod session;
mod types;
mod version;

pub use client::{ClientConfig, HttpConnector, HttpSession};
pub use error::{ApiError, Result};
pub use session::{Connector, Session};
pub use types::{
    AuthMethod, DeliveryRetryPolicy, EventDestination, EventProtocol, EventType,
    ServerDescriptor, SubscriptionPayload,
};
pub use version::{ParseVersionError, RedfishVersion};
