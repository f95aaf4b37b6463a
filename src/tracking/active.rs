use crate::ingest::{DelegationEvent, TimeKey};

use super::matching::MatchStrategy;

/// Start events that have no matching End yet, oldest first.
///
/// Uses [`MatchStrategy::Fifo`]: per `(run_id, agent_name, depth)` the first
/// `n` Starts are considered finished when `n` Ends have been seen.
pub fn active_delegations(events: &[DelegationEvent]) -> Vec<DelegationEvent> {
    let mut pending: Vec<(TimeKey<'_>, usize)> = MatchStrategy::Fifo
        .pair(events)
        .into_iter()
        .filter(|pairing| pairing.end.is_none())
        .map(|pairing| (TimeKey::new(events[pairing.start].timestamp()), pairing.start))
        .collect();
    // Equal start times keep file order.
    pending.sort_unstable();
    pending.into_iter().map(|(_, idx)| events[idx].clone()).collect()
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
