use serde::Serialize;
use strum::{Display, EnumIter};

/// Topology notification delivered by the device subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TopologyEvent {
    ClientStart,
    ClientExit,
    ClientChange,
    PortStart,
    PortExit,
    PortChange,
    PortSubscribed,
    PortUnsubscribed,
}

impl TopologyEvent {
    /// Whether this kind of event schedules a rebuild-and-reconcile pass.
    /// Other kinds are observed and dropped.
    pub const fn triggers_rebuild(self) -> bool {
        matches!(
            self,
            Self::ClientChange | Self::PortStart | Self::PortChange | Self::PortUnsubscribed
        )
    }
}
