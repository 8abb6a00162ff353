//! ALSA sequencer binding for `amidipersist-core`.
//!
//! [`open_graph`] returns the sequencer as a [`DeviceGraph`];
//! [`watch_topology`] starts a monitor thread that listens on
//! System:Announce and forwards client and port notifications as
//! [`TopologyEvent`]s. Both need the `alsa` feature; without it they
//! return [`SeqError::BackendDisabled`].

mod error;
#[cfg(feature = "alsa")]
mod monitor;
#[cfg(feature = "alsa")]
mod sequencer;

use tokio::sync::mpsc;

use amidipersist_core::{DeviceGraph, TopologyEvent};

pub use error::SeqError;
#[cfg(feature = "alsa")]
pub use sequencer::AlsaSequencer;

/// Capacity of the topology event channel.
pub const EVENT_CHANNEL_SIZE: usize = 64;

/// Whether this build can talk to ALSA at all.
pub const fn backend_enabled() -> bool {
    cfg!(feature = "alsa")
}

/// Open the default sequencer under `client_name`.
#[cfg(feature = "alsa")]
pub fn open_graph(client_name: &str) -> Result<Box<dyn DeviceGraph>, SeqError> {
    Ok(Box::new(AlsaSequencer::open(client_name)?))
}

#[cfg(not(feature = "alsa"))]
pub fn open_graph(_client_name: &str) -> Result<Box<dyn DeviceGraph>, SeqError> {
    Err(SeqError::BackendDisabled)
}

/// Start the topology monitor and return its event feed.
///
/// The monitor registers as `<client_name>-monitor`. It stops once the
/// receiver is dropped and the next notification arrives.
#[cfg(feature = "alsa")]
pub fn watch_topology(client_name: &str) -> Result<mpsc::Receiver<TopologyEvent>, SeqError> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    monitor::spawn(client_name, tx)?;
    Ok(rx)
}

#[cfg(not(feature = "alsa"))]
pub fn watch_topology(_client_name: &str) -> Result<mpsc::Receiver<TopologyEvent>, SeqError> {
    Err(SeqError::BackendDisabled)
}
