// ── Domain model ──
//
// Identity types, routing rules and the per-pass outcome records.

pub mod address;
pub mod report;
pub mod rule;

pub use address::{DeviceAddress, DeviceName};
pub use report::{ConnectionOutcome, Outcome, PassReport};
pub use rule::{ConnectionRule, DesiredConnection, RuleState};
