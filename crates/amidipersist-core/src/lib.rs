//! Reconciliation engine for persistent MIDI routing.
//!
//! Keeps a list of name-based routing rules satisfied against a live,
//! externally owned device graph whose numeric addresses change whenever
//! devices come and go:
//!
//! - **[`GraphSnapshot`]**: Immutable picture of clients, ports and
//!   subscriptions, rebuilt from scratch on every pass through the
//!   [`DeviceGraph`] seam.
//!
//! - **[`resolve()`]** / **[`expand()`]**: Turn a `client:port` name into
//!   every address carrying it, and a rule into the cross product of its
//!   resolved endpoints.
//!
//! - **[`Reconciler`]**: Connects whatever desired connection is missing.
//!   Additive only; never disconnects.
//!
//! - **[`Controller`]**: Runs one pass at startup, then one coalesced pass
//!   per settled burst of topology events.
//!
//! [`MemoryGraph`] is a scriptable in-process [`DeviceGraph`] for tests and
//! dry runs; the ALSA binding lives in `amidipersist-seq`.

pub mod controller;
pub mod error;
pub mod expander;
pub mod model;
pub mod provider;
pub mod reconciler;
pub mod resolver;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::{Controller, ControllerConfig, ControllerState, DEFAULT_SETTLE_DELAY};
pub use error::{CoreError, ProviderError};
pub use expander::expand;
pub use model::{
    ConnectionOutcome, ConnectionRule, DesiredConnection, DeviceAddress, DeviceName, Outcome,
    PassReport, RuleState,
};
pub use provider::{
    ClientRecord, DeviceGraph, Enumeration, MemoryGraph, PortCaps, PortRecord, TopologyEvent,
};
pub use reconciler::{Plan, Reconciler, plan, run_pass};
pub use resolver::{resolve, resolve_name};
pub use snapshot::GraphSnapshot;
