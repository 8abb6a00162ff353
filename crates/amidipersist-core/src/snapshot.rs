// ── Graph snapshot ──
//
// One immutable picture of the device graph, built from scratch every
// pass. Nothing is carried over from the previous snapshot; the controller
// swaps the whole value when a new one is ready.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::model::{DeviceAddress, DeviceName};
use crate::provider::{DeviceGraph, PortCaps};

#[derive(Debug, Clone, Default)]
struct ClientEntry {
    name: String,
    ports: BTreeMap<u8, String>,
}

/// Immutable view of clients, ports and subscriptions for one generation.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    generation: u64,
    clients: BTreeMap<u8, ClientEntry>,
    name_to_addresses: BTreeMap<DeviceName, BTreeSet<DeviceAddress>>,
    address_to_name: BTreeMap<DeviceAddress, DeviceName>,
    subscriptions: BTreeMap<DeviceAddress, BTreeSet<DeviceAddress>>,
}

impl GraphSnapshot {
    /// An empty snapshot, used before the first pass has run.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Enumerate the whole graph: clients, then each client's ports, then
    /// the subscribers of every subscribable-for-read port.
    ///
    /// An enumeration error ends the loop at the level where it happened;
    /// what was collected so far is kept and the outer levels carry on.
    pub fn build<G: DeviceGraph + ?Sized>(graph: &G, generation: u64) -> Self {
        let mut snap = Self::empty(generation);

        for client in graph.clients() {
            let client = match client {
                Ok(client) => client,
                Err(e) => {
                    warn!(generation, error = %e, "client enumeration ended early");
                    break;
                }
            };

            let mut entry = ClientEntry {
                name: client.name.clone(),
                ports: BTreeMap::new(),
            };

            for port in graph.ports(client.id) {
                let port = match port {
                    Ok(port) => port,
                    Err(e) => {
                        warn!(
                            generation,
                            client = client.id,
                            error = %e,
                            "port enumeration ended early"
                        );
                        break;
                    }
                };

                let addr = DeviceAddress::new(client.id, port.id);
                let name = DeviceName::new(client.name.clone(), port.name.clone());
                snap.name_to_addresses
                    .entry(name.clone())
                    .or_default()
                    .insert(addr);
                snap.address_to_name.insert(addr, name);
                entry.ports.insert(port.id, port.name);

                if port.caps.contains(PortCaps::SUBS_READ) {
                    snap.collect_subscribers(graph, addr);
                }
            }

            snap.clients.insert(client.id, entry);
        }

        debug!(
            generation,
            clients = snap.client_count(),
            ports = snap.port_count(),
            subscriptions = snap.subscription_count(),
            "graph snapshot built"
        );
        snap
    }

    fn collect_subscribers<G: DeviceGraph + ?Sized>(&mut self, graph: &G, source: DeviceAddress) {
        for dest in graph.subscribers(source) {
            match dest {
                Ok(dest) => {
                    self.subscriptions.entry(source).or_default().insert(dest);
                }
                Err(e) => {
                    warn!(
                        generation = self.generation,
                        %source,
                        error = %e,
                        "subscriber enumeration ended early"
                    );
                    break;
                }
            }
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Every address currently carrying `name`, across all clients sharing it.
    pub fn addresses_named(&self, name: &DeviceName) -> Option<&BTreeSet<DeviceAddress>> {
        self.name_to_addresses.get(name)
    }

    pub fn name_of(&self, addr: DeviceAddress) -> Option<&DeviceName> {
        self.address_to_name.get(&addr)
    }

    /// Name for display; addresses seen only as subscribers render as `?:?`.
    pub fn display_name(&self, addr: DeviceAddress) -> DeviceName {
        self.name_of(addr)
            .cloned()
            .unwrap_or_else(|| DeviceName::new("?", "?"))
    }

    pub fn subscribers_of(&self, source: DeviceAddress) -> Option<&BTreeSet<DeviceAddress>> {
        self.subscriptions.get(&source)
    }

    pub fn is_subscribed(&self, source: DeviceAddress, dest: DeviceAddress) -> bool {
        self.subscribers_of(source)
            .is_some_and(|dests| dests.contains(&dest))
    }

    /// All `(source, dest)` subscriptions, ordered by source then dest.
    pub fn subscriptions(&self) -> impl Iterator<Item = (DeviceAddress, DeviceAddress)> + '_ {
        self.subscriptions
            .iter()
            .flat_map(|(src, dests)| dests.iter().map(move |dst| (*src, *dst)))
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(BTreeSet::len).sum()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn port_count(&self) -> usize {
        self.address_to_name.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::MemoryGraph;
    use pretty_assertions::assert_eq;

    fn addr(client: u8, port: u8) -> DeviceAddress {
        DeviceAddress::new(client, port)
    }

    fn studio() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph
            .add_client(0, "System")
            .add_port(0, 0, "Timer", PortCaps::SOURCE)
            .add_port(0, 1, "Announce", PortCaps::SOURCE)
            .add_client(20, "KeyStep")
            .add_port(20, 0, "KeyStep MIDI 1", PortCaps::DUPLEX)
            .add_client(128, "FLUID Synth")
            .add_port(128, 0, "Synth input port", PortCaps::SINK)
            .subscribe(addr(20, 0), addr(128, 0));
        graph
    }

    #[test]
    fn build_indexes_names_and_addresses() {
        let snap = GraphSnapshot::build(&studio(), 1);

        assert_eq!(snap.generation(), 1);
        assert_eq!(snap.client_count(), 3);
        assert_eq!(snap.port_count(), 4);

        let name = DeviceName::new("KeyStep", "KeyStep MIDI 1");
        assert_eq!(snap.name_of(addr(20, 0)), Some(&name));
        assert!(snap.addresses_named(&name).unwrap().contains(&addr(20, 0)));
    }

    #[test]
    fn build_collects_subscriptions() {
        let snap = GraphSnapshot::build(&studio(), 1);

        assert!(snap.is_subscribed(addr(20, 0), addr(128, 0)));
        assert!(!snap.is_subscribed(addr(128, 0), addr(20, 0)));
        assert_eq!(snap.subscription_count(), 1);
        assert_eq!(
            snap.subscriptions().collect::<Vec<_>>(),
            vec![(addr(20, 0), addr(128, 0))]
        );
    }

    #[test]
    fn sink_only_ports_are_not_queried_for_subscribers() {
        let mut graph = studio();
        // A subscription recorded on a port without SUBS_READ is invisible.
        graph.subscribe(addr(128, 0), addr(20, 0));

        let snap = GraphSnapshot::build(&graph, 1);
        assert!(!snap.is_subscribed(addr(128, 0), addr(20, 0)));
    }

    #[test]
    fn rebuild_does_not_merge_with_previous() {
        let mut graph = studio();
        let first = GraphSnapshot::build(&graph, 1);
        assert_eq!(first.client_count(), 3);

        graph.remove_client(128);
        let second = GraphSnapshot::build(&graph, 2);

        assert_eq!(second.client_count(), 2);
        assert!(second.name_of(addr(128, 0)).is_none());
        assert_eq!(second.subscription_count(), 0);
        // The first snapshot is untouched.
        assert!(first.is_subscribed(addr(20, 0), addr(128, 0)));
    }

    #[test]
    fn client_enumeration_error_keeps_partial_result() {
        let mut graph = studio();
        graph.fail_clients_after(2);

        let snap = GraphSnapshot::build(&graph, 1);
        assert_eq!(snap.client_count(), 2);
        assert!(snap.name_of(addr(128, 0)).is_none());
    }

    #[test]
    fn port_enumeration_error_does_not_abort_other_clients() {
        let mut graph = studio();
        graph.fail_ports_after(0, 1);

        let snap = GraphSnapshot::build(&graph, 1);
        assert!(snap.name_of(addr(0, 0)).is_some());
        assert!(snap.name_of(addr(0, 1)).is_none());
        // Clients after the failing one are still enumerated.
        assert!(snap.name_of(addr(20, 0)).is_some());
        assert!(snap.name_of(addr(128, 0)).is_some());
    }

    #[test]
    fn unknown_subscriber_renders_placeholder_name() {
        let mut graph = studio();
        graph.subscribe(addr(20, 0), addr(99, 3));

        let snap = GraphSnapshot::build(&graph, 1);
        assert!(snap.is_subscribed(addr(20, 0), addr(99, 3)));
        assert_eq!(snap.display_name(addr(99, 3)).to_string(), "?:?");
    }

    #[test]
    fn name_index_spans_duplicate_clients() {
        let mut graph = MemoryGraph::new();
        graph
            .add_client(24, "synth")
            .add_port(24, 0, "in", PortCaps::SINK)
            .add_client(28, "synth")
            .add_port(28, 0, "in", PortCaps::SINK);

        let snap = GraphSnapshot::build(&graph, 1);
        let found = snap.addresses_named(&DeviceName::new("synth", "in")).unwrap();
        assert_eq!(found.iter().copied().collect::<Vec<_>>(), vec![addr(24, 0), addr(28, 0)]);
        assert!(snap.addresses_named(&DeviceName::new("Synth", "in")).is_none());
    }
}
