// ── Diff-and-converge ──
//
// Compare the desired connection set against the snapshot's subscription
// table and connect whatever is missing. Additive only: subscriptions
// outside the desired set are never touched, and one failed connect does
// not stop the rest of the pass.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::expander::expand;
use crate::model::{ConnectionOutcome, ConnectionRule, DesiredConnection, Outcome, PassReport};
use crate::provider::DeviceGraph;
use crate::snapshot::GraphSnapshot;

/// Desired connections for one pass, with the rules that produced none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub desired: BTreeSet<DesiredConnection>,
    pub unresolved_rules: usize,
}

/// Expand every rule against `snapshot` and union the results.
///
/// Rules whose state does not permit reconnecting are skipped.
pub fn plan(rules: &[ConnectionRule], snapshot: &GraphSnapshot) -> Plan {
    let mut plan = Plan::default();
    for rule in rules {
        if !rule.state.permits_reconnect() {
            debug!(%rule, state = ?rule.state, "rule skipped by state");
            continue;
        }
        let expanded = expand(rule, snapshot);
        if expanded.is_empty() {
            plan.unresolved_rules += 1;
        }
        plan.desired.extend(expanded);
    }
    plan
}

/// Connects issued against one snapshot generation.
///
/// A snapshot does not see the subscriptions made after it was built, so
/// the reconciler remembers what it connected for the current generation
/// and treats those as satisfied on a repeated call. The memory is dropped
/// as soon as a snapshot of another generation comes in.
#[derive(Debug, Default)]
pub struct Reconciler {
    generation: Option<u64>,
    issued: BTreeSet<DesiredConnection>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a connect for every desired connection not already subscribed.
    ///
    /// Returns one outcome per desired connection, in set order.
    pub fn reconcile<G: DeviceGraph + ?Sized>(
        &mut self,
        desired: &BTreeSet<DesiredConnection>,
        snapshot: &GraphSnapshot,
        graph: &mut G,
    ) -> Vec<ConnectionOutcome> {
        if self.generation != Some(snapshot.generation()) {
            self.generation = Some(snapshot.generation());
            self.issued.clear();
        }

        desired
            .iter()
            .map(|conn| {
                let source_name = snapshot.display_name(conn.source);
                let dest_name = snapshot.display_name(conn.dest);

                let outcome = if snapshot.is_subscribed(conn.source, conn.dest)
                    || self.issued.contains(conn)
                {
                    Outcome::Satisfied
                } else {
                    match graph.connect(conn.source, conn.dest) {
                        Ok(()) => {
                            info!(
                                source = %source_name,
                                source_addr = %conn.source,
                                dest = %dest_name,
                                dest_addr = %conn.dest,
                                "connected"
                            );
                            self.issued.insert(*conn);
                            Outcome::Connected
                        }
                        Err(e) => {
                            warn!(
                                source = %source_name,
                                source_addr = %conn.source,
                                dest = %dest_name,
                                dest_addr = %conn.dest,
                                error = %e,
                                "unable to connect"
                            );
                            Outcome::Failed(e.to_string())
                        }
                    }
                };

                ConnectionOutcome {
                    connection: *conn,
                    source_name,
                    dest_name,
                    outcome,
                }
            })
            .collect()
    }
}

/// One full pass: rebuild the snapshot, plan, reconcile.
pub fn run_pass<G: DeviceGraph + ?Sized>(
    reconciler: &mut Reconciler,
    rules: &[ConnectionRule],
    graph: &mut G,
    generation: u64,
) -> (Arc<GraphSnapshot>, PassReport) {
    let snapshot = Arc::new(GraphSnapshot::build(graph, generation));
    let plan = plan(rules, &snapshot);
    let outcomes = reconciler.reconcile(&plan.desired, &snapshot, graph);

    let report = PassReport {
        generation,
        finished_at: Utc::now(),
        rules: rules.len(),
        unresolved_rules: plan.unresolved_rules,
        outcomes,
    };
    debug!(
        generation,
        desired = plan.desired.len(),
        connected = report.connected_count(),
        failed = report.failed_count(),
        unresolved = report.unresolved_rules,
        "pass complete"
    );
    (snapshot, report)
}
