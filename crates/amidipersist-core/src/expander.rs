// ── Rule expansion ──
//
// A rule is "every connection that satisfies it": when names match
// several physical endpoints, all source/destination combinations are
// desired.

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{ConnectionRule, DesiredConnection};
use crate::resolver::resolve_name;
use crate::snapshot::GraphSnapshot;

/// Expand `rule` into the cross product of its resolved endpoints.
///
/// If either side resolves to nothing the rule contributes no connections
/// this pass.
pub fn expand(rule: &ConnectionRule, snapshot: &GraphSnapshot) -> BTreeSet<DesiredConnection> {
    let sources = resolve_name(snapshot, &rule.source);
    let dests = resolve_name(snapshot, &rule.dest);

    if sources.is_empty() || dests.is_empty() {
        debug!(
            generation = snapshot.generation(),
            %rule,
            sources = sources.len(),
            dests = dests.len(),
            "rule unresolved"
        );
        return BTreeSet::new();
    }

    sources
        .iter()
        .flat_map(|src| dests.iter().map(move |dst| DesiredConnection::new(*src, *dst)))
        .collect()
}
