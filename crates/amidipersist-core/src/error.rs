// ── Core error types ──
//
// ProviderError covers everything a device-graph provider can report.
// CoreError is what the controller surfaces to the binary; per-connection
// failures never become a CoreError, they are recorded in the PassReport.

use thiserror::Error;

/// Failure reported by a [`DeviceGraph`](crate::DeviceGraph) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Enumeration of clients, ports or subscribers failed part-way.
    #[error("Enumeration of {what} failed: {reason}")]
    Enumeration { what: String, reason: String },

    /// The provider refused a connect request.
    #[error("Connect rejected: {reason}")]
    ConnectRejected { reason: String },

    /// The provider reported an id outside the `u8` address space.
    #[error("Address out of range: {client}:{port}")]
    AddressOutOfRange { client: i32, port: i32 },
}

impl ProviderError {
    pub fn enumeration(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Enumeration {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::ConnectRejected {
            reason: reason.into(),
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The device subsystem could not be opened.
    #[error("Device graph provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    /// The topology event feed stopped delivering events.
    #[error("Topology event feed closed")]
    EventFeedClosed,
}
