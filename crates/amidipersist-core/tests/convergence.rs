#![allow(clippy::unwrap_used)]
// End-to-end controller behavior against a graph that changes underneath it.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use amidipersist_core::{
    ClientRecord, ConnectionRule, Controller, ControllerConfig, CoreError, DeviceAddress,
    DeviceGraph, Enumeration, MemoryGraph, PassReport, PortCaps, PortRecord, ProviderError,
    TopologyEvent,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// A `MemoryGraph` the test can keep editing while the controller owns a handle.
#[derive(Clone, Default)]
struct SharedGraph(Arc<Mutex<MemoryGraph>>);

impl SharedGraph {
    fn edit(&self, f: impl FnOnce(&mut MemoryGraph)) {
        f(&mut *self.0.lock().unwrap());
    }

    fn is_subscribed(&self, source: DeviceAddress, dest: DeviceAddress) -> bool {
        self.0.lock().unwrap().is_subscribed(source, dest)
    }
}

impl DeviceGraph for SharedGraph {
    fn clients(&self) -> Enumeration<'_, ClientRecord> {
        let items: Vec<_> = self.0.lock().unwrap().clients().collect();
        Box::new(items.into_iter())
    }

    fn ports(&self, client: u8) -> Enumeration<'_, PortRecord> {
        let items: Vec<_> = self.0.lock().unwrap().ports(client).collect();
        Box::new(items.into_iter())
    }

    fn subscribers(&self, source: DeviceAddress) -> Enumeration<'_, DeviceAddress> {
        let items: Vec<_> = self.0.lock().unwrap().subscribers(source).collect();
        Box::new(items.into_iter())
    }

    fn connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> Result<(), ProviderError> {
        self.0.lock().unwrap().connect(source, dest)
    }
}

fn addr(client: u8, port: u8) -> DeviceAddress {
    DeviceAddress::new(client, port)
}

fn keystep_only() -> SharedGraph {
    let graph = SharedGraph::default();
    graph.edit(|g| {
        g.add_client(0, "System")
            .add_port(0, 1, "Announce", PortCaps::SOURCE)
            .add_client(20, "KeyStep")
            .add_port(20, 0, "out", PortCaps::SOURCE);
    });
    graph
}

fn rules() -> Vec<ConnectionRule> {
    vec![ConnectionRule::from_fields("KeyStep", "out", "synth", "in")]
}

async fn next_report(rx: &mut broadcast::Receiver<Arc<PassReport>>) -> Arc<PassReport> {
    rx.recv().await.unwrap()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_hotplug_and_readdressing_converge() {
    let graph = keystep_only();
    let mut ctl = Controller::new(graph.clone(), rules(), ControllerConfig::default());
    let mut reports = ctl.subscribe_reports();
    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    let task_cancel = cancel.clone();
    let task = tokio::spawn(async move { ctl.run(rx, task_cancel).await });

    // Startup: the destination is absent, the rule is simply unresolved.
    let initial = next_report(&mut reports).await;
    assert_eq!(initial.generation, 1);
    assert_eq!(initial.unresolved_rules, 1);
    assert_eq!(initial.connects_issued(), 0);

    // The synth is plugged in.
    graph.edit(|g| {
        g.add_client(24, "synth")
            .add_port(24, 0, "in", PortCaps::SINK);
    });
    tx.send(TopologyEvent::ClientStart).await.unwrap();
    tx.send(TopologyEvent::PortStart).await.unwrap();
    let plugged = next_report(&mut reports).await;
    assert_eq!(plugged.generation, 2);
    assert_eq!(plugged.connected_count(), 1);
    assert!(graph.is_subscribed(addr(20, 0), addr(24, 0)));

    // The operator removes the subscription by hand; it comes back.
    graph.edit(|g| {
        g.unsubscribe(addr(20, 0), addr(24, 0));
    });
    tx.send(TopologyEvent::PortUnsubscribed).await.unwrap();
    let restored = next_report(&mut reports).await;
    assert_eq!(restored.connected_count(), 1);
    assert!(graph.is_subscribed(addr(20, 0), addr(24, 0)));

    // Replugged under a new client number.
    graph.edit(|g| {
        g.remove_client(24)
            .add_client(130, "synth")
            .add_port(130, 0, "in", PortCaps::SINK);
    });
    tx.send(TopologyEvent::ClientExit).await.unwrap();
    tx.send(TopologyEvent::PortStart).await.unwrap();
    let moved = next_report(&mut reports).await;
    assert_eq!(moved.connected_count(), 1);
    assert_eq!(moved.outcomes[0].connection.dest, addr(130, 0));
    assert!(graph.is_subscribed(addr(20, 0), addr(130, 0)));

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_steady_graph_issues_no_connects() {
    let graph = keystep_only();
    graph.edit(|g| {
        g.add_client(24, "synth")
            .add_port(24, 0, "in", PortCaps::SINK);
    });
    let mut ctl = Controller::new(graph.clone(), rules(), ControllerConfig::default());
    let mut reports = ctl.subscribe_reports();
    let (tx, rx) = mpsc::channel(16);

    tx.send(TopologyEvent::PortChange).await.unwrap();
    tx.send(TopologyEvent::PortChange).await.unwrap();
    drop(tx);

    let result = ctl.run(rx, CancellationToken::new()).await;
    assert!(matches!(result, Err(CoreError::EventFeedClosed)));

    let first = next_report(&mut reports).await;
    let second = next_report(&mut reports).await;
    assert_eq!(first.connects_issued(), 1);
    assert_eq!(second.connects_issued(), 0);
    assert_eq!(second.satisfied_count(), 1);
    assert!(reports.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_names_fan_out() {
    let graph = keystep_only();
    graph.edit(|g| {
        g.add_client(24, "synth")
            .add_port(24, 0, "in", PortCaps::SINK)
            .add_client(28, "synth")
            .add_port(28, 0, "in", PortCaps::SINK);
    });
    let mut ctl = Controller::new(graph.clone(), rules(), ControllerConfig::default());

    let report = ctl.run_once();

    assert_eq!(report.connected_count(), 2);
    assert!(graph.is_subscribed(addr(20, 0), addr(24, 0)));
    assert!(graph.is_subscribed(addr(20, 0), addr(28, 0)));
    let snapshot = ctl.snapshot();
    assert_eq!(snapshot.subscription_count(), 0);
    assert_eq!(snapshot.generation(), 1);
}
