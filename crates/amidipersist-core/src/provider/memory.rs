// ── In-memory device graph ──
//
// A scriptable stand-in for the device subsystem: clients, ports and
// subscriptions live in ordered maps, connects mutate them the way the
// sequencer would, and failures can be injected per connection or per
// enumeration level.

use std::collections::{BTreeMap, BTreeSet};

use super::{ClientRecord, DeviceGraph, Enumeration, PortCaps, PortRecord};
use crate::error::ProviderError;
use crate::model::{DesiredConnection, DeviceAddress};

#[derive(Debug, Clone, Default)]
struct MemoryClient {
    name: String,
    ports: BTreeMap<u8, (String, PortCaps)>,
    /// Yield an error after this many ports.
    port_error_after: Option<usize>,
}

/// In-memory [`DeviceGraph`].
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    clients: BTreeMap<u8, MemoryClient>,
    subscriptions: BTreeMap<DeviceAddress, BTreeSet<DeviceAddress>>,
    rejected: BTreeSet<DesiredConnection>,
    client_error_after: Option<usize>,
    connect_log: Vec<DesiredConnection>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Topology edits ───────────────────────────────────────────────

    /// Add (or rename) a client.
    pub fn add_client(&mut self, id: u8, name: impl Into<String>) -> &mut Self {
        self.clients.entry(id).or_default().name = name.into();
        self
    }

    /// Add a port to an existing client. Unknown clients are created unnamed.
    pub fn add_port(
        &mut self,
        client: u8,
        port: u8,
        name: impl Into<String>,
        caps: PortCaps,
    ) -> &mut Self {
        self.clients
            .entry(client)
            .or_default()
            .ports
            .insert(port, (name.into(), caps));
        self
    }

    /// Remove a client, its ports and every subscription touching them.
    pub fn remove_client(&mut self, id: u8) -> &mut Self {
        self.clients.remove(&id);
        self.subscriptions.retain(|src, _| src.client != id);
        for dests in self.subscriptions.values_mut() {
            dests.retain(|dst| dst.client != id);
        }
        self.subscriptions.retain(|_, dests| !dests.is_empty());
        self
    }

    /// Record a subscription directly, bypassing capability checks.
    pub fn subscribe(&mut self, source: DeviceAddress, dest: DeviceAddress) -> &mut Self {
        self.subscriptions.entry(source).or_default().insert(dest);
        self
    }

    pub fn unsubscribe(&mut self, source: DeviceAddress, dest: DeviceAddress) -> &mut Self {
        if let Some(dests) = self.subscriptions.get_mut(&source) {
            dests.remove(&dest);
            if dests.is_empty() {
                self.subscriptions.remove(&source);
            }
        }
        self
    }

    pub fn is_subscribed(&self, source: DeviceAddress, dest: DeviceAddress) -> bool {
        self.subscriptions
            .get(&source)
            .is_some_and(|dests| dests.contains(&dest))
    }

    // ── Failure injection ────────────────────────────────────────────

    /// Make every connect of this pair fail.
    pub fn reject_connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> &mut Self {
        self.rejected.insert(DesiredConnection::new(source, dest));
        self
    }

    /// Yield an enumeration error after `count` clients.
    pub fn fail_clients_after(&mut self, count: usize) -> &mut Self {
        self.client_error_after = Some(count);
        self
    }

    /// Yield an enumeration error after `count` ports of `client`.
    pub fn fail_ports_after(&mut self, client: u8, count: usize) -> &mut Self {
        self.clients.entry(client).or_default().port_error_after = Some(count);
        self
    }

    // ── Connect log ──────────────────────────────────────────────────

    /// Every connect attempted so far, accepted or not, in call order.
    pub fn connect_log(&self) -> &[DesiredConnection] {
        &self.connect_log
    }

    pub fn clear_connect_log(&mut self) {
        self.connect_log.clear();
    }

    fn port(&self, addr: DeviceAddress) -> Option<&(String, PortCaps)> {
        self.clients.get(&addr.client)?.ports.get(&addr.port)
    }
}

/// Splice an error item into an enumeration after `after` items.
fn with_error_after<'a, T: 'a>(
    items: Vec<T>,
    after: Option<usize>,
    what: &'static str,
) -> Enumeration<'a, T> {
    let mut out: Vec<Result<T, ProviderError>> = Vec::with_capacity(items.len() + 1);
    for (idx, item) in items.into_iter().enumerate() {
        if after == Some(idx) {
            out.push(Err(ProviderError::enumeration(what, "injected failure")));
        }
        out.push(Ok(item));
    }
    if let Some(n) = after {
        if n >= out.len() {
            out.push(Err(ProviderError::enumeration(what, "injected failure")));
        }
    }
    Box::new(out.into_iter())
}

impl DeviceGraph for MemoryGraph {
    fn clients(&self) -> Enumeration<'_, ClientRecord> {
        let items = self
            .clients
            .iter()
            .map(|(id, c)| ClientRecord {
                id: *id,
                name: c.name.clone(),
            })
            .collect();
        with_error_after(items, self.client_error_after, "clients")
    }

    fn ports(&self, client: u8) -> Enumeration<'_, PortRecord> {
        let Some(entry) = self.clients.get(&client) else {
            return Box::new(std::iter::empty());
        };
        let items = entry
            .ports
            .iter()
            .map(|(id, (name, caps))| PortRecord {
                id: *id,
                name: name.clone(),
                caps: *caps,
            })
            .collect();
        with_error_after(items, entry.port_error_after, "ports")
    }

    fn subscribers(&self, source: DeviceAddress) -> Enumeration<'_, DeviceAddress> {
        let items: Vec<_> = self
            .subscriptions
            .get(&source)
            .map(|dests| dests.iter().copied().collect())
            .unwrap_or_default();
        Box::new(items.into_iter().map(Ok))
    }

    fn connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> Result<(), ProviderError> {
        self.connect_log.push(DesiredConnection::new(source, dest));

        if self.rejected.contains(&DesiredConnection::new(source, dest)) {
            return Err(ProviderError::rejected("rejected by test script"));
        }
        let Some((_, src_caps)) = self.port(source) else {
            return Err(ProviderError::rejected(format!("no such port {source}")));
        };
        let Some((_, dst_caps)) = self.port(dest) else {
            return Err(ProviderError::rejected(format!("no such port {dest}")));
        };
        if !src_caps.contains(PortCaps::SUBS_READ) || !dst_caps.contains(PortCaps::SUBS_WRITE) {
            return Err(ProviderError::rejected("operation not permitted"));
        }
        if self.is_subscribed(source, dest) {
            return Err(ProviderError::rejected("device or resource busy"));
        }

        self.subscribe(source, dest);
        Ok(())
    }
}
