// ── Core identity types ──
//
// DeviceAddress and DeviceName are the two ways of pointing at a port.
// Addresses come from the provider and are only meaningful inside the
// snapshot generation that produced them; names come from the operator
// and may match any number of addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── DeviceAddress ───────────────────────────────────────────────────

/// Numeric `client:port` address assigned by the device subsystem.
///
/// Ids are reused after a client or port is destroyed and recreated, so
/// never carry one from one snapshot into the next without resolving the
/// name again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub client: u8,
    pub port: u8,
}

impl DeviceAddress {
    pub const fn new(client: u8, port: u8) -> Self {
        Self { client, port }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.port)
    }
}

impl From<(u8, u8)> for DeviceAddress {
    fn from((client, port): (u8, u8)) -> Self {
        Self { client, port }
    }
}

// ── DeviceName ──────────────────────────────────────────────────────

/// Human-readable `client:port` name pair. Not unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceName {
    pub client: String,
    pub port: String,
}

impl DeviceName {
    pub fn new(client: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.port)
    }
}
