// ── Endpoint resolution ──
//
// Names are not unique: several clients may share a name, and each may
// own a port with the requested name. The snapshot's name index already
// holds the union, so resolution is a single lookup.

use std::collections::BTreeSet;

use crate::model::{DeviceAddress, DeviceName};
use crate::snapshot::GraphSnapshot;

/// Resolve `(client_name, port_name)` to every matching address in `snapshot`.
///
/// Exact, case-sensitive comparison on both fields. An empty set means the
/// endpoint is not present in this generation.
pub fn resolve(
    snapshot: &GraphSnapshot,
    client_name: &str,
    port_name: &str,
) -> BTreeSet<DeviceAddress> {
    resolve_name(snapshot, &DeviceName::new(client_name, port_name))
}

pub fn resolve_name(snapshot: &GraphSnapshot, name: &DeviceName) -> BTreeSet<DeviceAddress> {
    snapshot.addresses_named(name).cloned().unwrap_or_default()
}
