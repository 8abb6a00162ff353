// ── Routing rules and the connections they expand into ──

use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::{DeviceAddress, DeviceName};

// ── RuleState ───────────────────────────────────────────────────────

/// Reserved per-rule reconnect state.
///
/// `ManuallyDisconnected` is meant to mark a rule whose subscription the
/// operator removed by hand, so that it is left alone until the port
/// cycles. That behavior is not implemented: both states reconnect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleState {
    #[default]
    Normal,
    ManuallyDisconnected,
}

impl RuleState {
    /// Whether the reconciler may issue connects for this rule.
    pub const fn permits_reconnect(self) -> bool {
        match self {
            Self::Normal | Self::ManuallyDisconnected => true,
        }
    }
}

// ── ConnectionRule ──────────────────────────────────────────────────

/// An operator-declared connection, by name. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRule {
    pub source: DeviceName,
    pub dest: DeviceName,
    #[serde(default)]
    pub state: RuleState,
}

impl ConnectionRule {
    pub fn new(source: DeviceName, dest: DeviceName) -> Self {
        Self {
            source,
            dest,
            state: RuleState::Normal,
        }
    }

    /// Build a rule from the four `src_client:src_port:dst_client:dst_port` fields.
    pub fn from_fields(
        src_client: impl Into<String>,
        src_port: impl Into<String>,
        dst_client: impl Into<String>,
        dst_port: impl Into<String>,
    ) -> Self {
        Self::new(
            DeviceName::new(src_client, src_port),
            DeviceName::new(dst_client, dst_port),
        )
    }
}

impl fmt::Display for ConnectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.dest)
    }
}

// ── DesiredConnection ───────────────────────────────────────────────

/// A concrete address pair one rule implies in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DesiredConnection {
    pub source: DeviceAddress,
    pub dest: DeviceAddress,
}

impl DesiredConnection {
    pub const fn new(source: DeviceAddress, dest: DeviceAddress) -> Self {
        Self { source, dest }
    }
}

impl fmt::Display for DesiredConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_normal() {
        let rule = ConnectionRule::from_fields("a", "b", "c", "d");
        assert_eq!(rule.state, RuleState::Normal);
    }

    #[test]
    fn every_state_reconnects() {
        assert!(RuleState::Normal.permits_reconnect());
        assert!(RuleState::ManuallyDisconnected.permits_reconnect());
    }

    #[test]
    fn rule_display() {
        let rule = ConnectionRule::from_fields("KeyStep", "out", "synth", "in");
        assert_eq!(rule.to_string(), "KeyStep:out -> synth:in");
    }
}
