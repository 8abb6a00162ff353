// ── Controller loop ──
//
// Drives the reconciler from topology notifications. One pass runs at
// startup; after that a qualifying event moves the loop into Settling,
// where it waits out the settle delay, drains whatever else queued up and
// runs exactly one pass for the whole burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::CoreError;
use crate::model::{ConnectionRule, PassReport};
use crate::provider::{DeviceGraph, TopologyEvent};
use crate::reconciler::{Reconciler, run_pass};
use crate::snapshot::GraphSnapshot;

const REPORT_CHANNEL_SIZE: usize = 64;

/// Default quiet period between a qualifying event and the pass it triggers.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

// ── ControllerConfig ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to let a burst of topology changes settle before rebuilding.
    pub settle_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

// ── ControllerState ──────────────────────────────────────────────

/// Loop state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ControllerState {
    Init,
    Steady,
    Settling,
    Exit,
}

// ── Controller ───────────────────────────────────────────────────

/// Owns the device graph and the rule list, and runs reconcile passes.
///
/// The rule list is fixed for the controller's lifetime. Snapshots are
/// replaced wholesale after every pass; readers holding an older
/// `Arc<GraphSnapshot>` keep a consistent view.
pub struct Controller<G> {
    graph: G,
    rules: Arc<[ConnectionRule]>,
    config: ControllerConfig,
    reconciler: Reconciler,
    generation: u64,
    state: watch::Sender<ControllerState>,
    snapshot: watch::Sender<Arc<GraphSnapshot>>,
    report_tx: broadcast::Sender<Arc<PassReport>>,
}

impl<G: DeviceGraph> Controller<G> {
    pub fn new(graph: G, rules: impl Into<Arc<[ConnectionRule]>>, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(ControllerState::Init);
        let (snapshot, _) = watch::channel(Arc::new(GraphSnapshot::empty(0)));
        let (report_tx, _) = broadcast::channel(REPORT_CHANNEL_SIZE);

        Self {
            graph,
            rules: rules.into(),
            config,
            reconciler: Reconciler::new(),
            generation: 0,
            state,
            snapshot,
            report_tx,
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    // ── State observation ────────────────────────────────────────

    /// The snapshot built by the most recent pass (generation 0 before any).
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Subscribe to loop state changes.
    pub fn state_changes(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    /// Subscribe to the report of every pass run after this call.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<Arc<PassReport>> {
        self.report_tx.subscribe()
    }

    // ── Passes ───────────────────────────────────────────────────

    /// Run a single pass outside the event loop: Init, one pass, Exit.
    pub fn run_once(&mut self) -> Arc<PassReport> {
        self.set_state(ControllerState::Init);
        let report = self.pass();
        self.set_state(ControllerState::Exit);
        report
    }

    /// Rebuild, reconcile and publish the results.
    fn pass(&mut self) -> Arc<PassReport> {
        self.generation += 1;
        let (snapshot, report) = run_pass(
            &mut self.reconciler,
            &self.rules,
            &mut self.graph,
            self.generation,
        );
        let report = Arc::new(report);

        self.snapshot.send_replace(snapshot);
        // No subscribers is fine.
        let _ = self.report_tx.send(Arc::clone(&report));
        report
    }

    /// Run the event loop until `cancel` fires or the feed closes.
    ///
    /// Returns `Ok(())` on cancellation and [`CoreError::EventFeedClosed`]
    /// when every sender of `events` has been dropped.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<TopologyEvent>,
        cancel: CancellationToken,
    ) -> Result<(), CoreError> {
        self.set_state(ControllerState::Init);
        let report = self.pass();
        info!(
            rules = self.rules.len(),
            connected = report.connected_count(),
            failed = report.failed_count(),
            "initial pass complete"
        );
        self.set_state(ControllerState::Steady);

        let result = loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => break Ok(()),
                event = events.recv() => event,
            };
            let Some(event) = event else {
                break Err(CoreError::EventFeedClosed);
            };
            if !event.triggers_rebuild() {
                trace!(%event, "topology event ignored");
                continue;
            }

            debug!(%event, delay = ?self.config.settle_delay, "settling");
            self.set_state(ControllerState::Settling);
            tokio::select! {
                biased;
                () = cancel.cancelled() => break Ok(()),
                () = tokio::time::sleep(self.config.settle_delay) => {}
            }

            let coalesced = drain(&mut events);
            let report = self.pass();
            debug!(
                generation = report.generation,
                coalesced,
                connected = report.connected_count(),
                "settled pass complete"
            );
            self.set_state(ControllerState::Steady);
        };

        self.set_state(ControllerState::Exit);
        result
    }

    fn set_state(&self, state: ControllerState) {
        self.state.send_replace(state);
    }
}

/// Discard every event already queued. A closed feed is noticed by the
/// next `recv`.
fn drain(events: &mut mpsc::Receiver<TopologyEvent>) -> usize {
    let mut count = 0;
    loop {
        match events.try_recv() {
            Ok(_) => count += 1,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return count,
        }
    }
}
