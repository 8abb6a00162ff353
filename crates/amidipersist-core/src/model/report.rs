// ── Pass outcome records ──
//
// What one reconciliation pass did, per desired connection. Reports carry
// names alongside addresses so they stay printable after the snapshot
// they came from has been replaced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::address::DeviceName;
use super::rule::DesiredConnection;

/// Result of evaluating one desired connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// Already subscribed in the snapshot; nothing issued.
    Satisfied,
    /// Connect issued and accepted by the provider.
    Connected,
    /// Connect issued and rejected.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionOutcome {
    pub connection: DesiredConnection,
    pub source_name: DeviceName,
    pub dest_name: DeviceName,
    pub outcome: Outcome,
}

impl ConnectionOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self.outcome, Outcome::Connected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) to {} ({})",
            self.source_name, self.connection.source, self.dest_name, self.connection.dest
        )
    }
}

/// Summary of one full rebuild-and-reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub generation: u64,
    pub finished_at: DateTime<Utc>,
    /// Rules evaluated this pass.
    pub rules: usize,
    /// Rules whose source or destination resolved to nothing.
    pub unresolved_rules: usize,
    pub outcomes: Vec<ConnectionOutcome>,
}

impl PassReport {
    pub fn connected(&self) -> impl Iterator<Item = &ConnectionOutcome> {
        self.outcomes.iter().filter(|o| o.is_connected())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ConnectionOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn connected_count(&self) -> usize {
        self.connected().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn satisfied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Satisfied)
            .count()
    }

    /// Number of connect calls issued during the pass.
    pub fn connects_issued(&self) -> usize {
        self.connected_count() + self.failed_count()
    }
}
