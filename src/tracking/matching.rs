//! Start/End pairing strategies.
//!
//! The log carries no correlation ids, so an End event has to be paired
//! with a Start purely from `(agent_name, depth, timestamp)`. Two views need
//! different answers and each keeps its own strategy:
//!
//! * [`MatchStrategy::Recency`] pairs an End with the most recently started
//!   unmatched Start of the same agent at the same depth (tree view).
//! * [`MatchStrategy::Fifo`] pairs Ends with Starts in arrival order per
//!   `(run_id, agent_name, depth)` (in-flight view).
//!
//! Neither is a verified causal trace. Identically named siblings at the
//! same depth that overlap in time can be paired wrongly.

use std::collections::HashMap;
use std::fmt;

use crate::ingest::{DelegationEvent, TimeKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Latest-started unmatched Start per `(agent_name, depth)` wins.
    Recency,
    /// First-started unmatched Start per `(run_id, agent_name, depth)` wins.
    Fifo,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Recency => write!(f, "recency"),
            MatchStrategy::Fifo => write!(f, "fifo"),
        }
    }
}

/// A Start event (by index into the event slice) and the End it was paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub start: usize,
    pub end: Option<usize>,
}

impl MatchStrategy {
    /// Pair End events with Start events. Returns one entry per Start, in file order.
    /// Ends that find no Start are dropped.
    pub fn pair(self, events: &[DelegationEvent]) -> Vec<Pairing> {
        match self {
            MatchStrategy::Recency => pair_by_recency(events),
            MatchStrategy::Fifo => pair_fifo(events),
        }
    }
}

fn pair_by_recency(events: &[DelegationEvent]) -> Vec<Pairing> {
    let mut pairings: Vec<Pairing> = Vec::new();
    // Unmatched Starts per key, sorted by (start time, pairing index). The
    // winner is always the last entry, so matching is a pop.
    let mut unmatched: HashMap<(&str, u32), Vec<(TimeKey<'_>, usize)>> = HashMap::new();

    for (idx, event) in events.iter().enumerate() {
        if event.is_start() {
            unmatched
                .entry((event.agent_name(), event.depth()))
                .or_default()
                .push((TimeKey::new(event.timestamp()), pairings.len()));
            pairings.push(Pairing { start: idx, end: None });
        }
    }
    for candidates in unmatched.values_mut() {
        candidates.sort_unstable();
    }

    for (idx, event) in events.iter().enumerate() {
        if event.is_start() {
            continue;
        }
        // On equal timestamps the higher pairing index, i.e. the later line, wins.
        match unmatched
            .get_mut(&(event.agent_name(), event.depth()))
            .and_then(Vec::pop)
        {
            Some((_, p)) => pairings[p].end = Some(idx),
            None => {
                tracing::debug!(agent = event.agent_name(), depth = event.depth(), "end event without start");
            }
        }
    }

    pairings
}

fn pair_fifo(events: &[DelegationEvent]) -> Vec<Pairing> {
    let mut pairings: Vec<Pairing> = Vec::new();
    let mut queues: HashMap<(Option<&str>, &str, u32), Vec<usize>> = HashMap::new();
    let mut ends: HashMap<(Option<&str>, &str, u32), Vec<usize>> = HashMap::new();

    for (idx, event) in events.iter().enumerate() {
        let key = (event.run_id(), event.agent_name(), event.depth());
        if event.is_start() {
            queues.entry(key).or_default().push(pairings.len());
            pairings.push(Pairing { start: idx, end: None });
        } else {
            ends.entry(key).or_default().push(idx);
        }
    }

    // The i-th End of a key completes the i-th Start of that key.
    for (key, end_indices) in &ends {
        let queue = queues.get(key).map(Vec::as_slice).unwrap_or(&[]);
        for (&p, &end_idx) in queue.iter().zip(end_indices) {
            pairings[p].end = Some(end_idx);
        }
        if end_indices.len() > queue.len() {
            tracing::debug!(
                agent = key.1,
                depth = key.2,
                surplus = end_indices.len() - queue.len(),
                "end events without start"
            );
        }
    }

    pairings
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
