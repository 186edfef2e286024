//! Redfish protocol version negotiation.
//!
//! Controllers advertise their version in the service root's
//! `RedfishVersion` field. The advertised version decides which request
//! shape a subscription create uses: 1.5 introduced registry-prefix and
//! resource-type filters plus an explicit delivery-retry policy; older
//! controllers only accept event-type filters.

use std::fmt;
use std::str::FromStr;

/// The version string did not look like `major.minor[.patch]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError;

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid Redfish version string")
    }
}

impl std::error::Error for ParseVersionError {}

/// A parsed `RedfishVersion` service-root value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RedfishVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RedfishVersion {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this controller accepts the modern request shape
    /// (registry/resource-type filters, delivery-retry policy).
    pub fn supports_event_filters(&self) -> bool {
        *self >= Self::new(1, 5, 0)
    }
}

impl FromStr for RedfishVersion {
    type Err = ParseVersionError;

    /// Parse "1.6.0" or "1.5" style strings. The patch component is
    /// optional; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or(ParseVersionError)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or(ParseVersionError)?;
        let patch = match parts.next() {
            Some(p) => p.parse().map_err(|_| ParseVersionError)?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(ParseVersionError);
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for RedfishVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
