//! Per-run summaries derived from the flat event log.

use std::collections::HashMap;

use crate::ingest::DelegationEvent;

/// One process invocation of the agent runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    /// Earliest timestamp seen for the run; `None` if every timestamp was empty.
    pub start_time: Option<String>,
    /// Latest timestamp seen for the run.
    pub end_time: Option<String>,
    /// Number of Start events.
    pub total_delegations: usize,
    pub completed_delegations: usize,
    pub failed_delegations: usize,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl RunSummary {
    fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            start_time: None,
            end_time: None,
            total_delegations: 0,
            completed_delegations: 0,
            failed_delegations: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
        }
    }

    fn observe(&mut self, event: &DelegationEvent) {
        // Plain string comparison: only sound while every writer emits the same
        // ISO-8601 shape (UTC, same precision).
        let ts = event.timestamp();
        if !ts.is_empty() {
            if self.start_time.as_deref().map_or(true, |cur| ts < cur) {
                self.start_time = Some(ts.to_string());
            }
            if self.end_time.as_deref().map_or(true, |cur| ts > cur) {
                self.end_time = Some(ts.to_string());
            }
        }

        match event {
            DelegationEvent::Start(_) => self.total_delegations += 1,
            DelegationEvent::End(end) => {
                self.completed_delegations += 1;
                if !end.success {
                    self.failed_delegations += 1;
                }
                self.total_tokens += end.tokens_used.unwrap_or(0);
                self.total_cost_usd += end.cost_usd.unwrap_or(0.0);
            }
        }
    }
}

/// Summarize every run in the log, newest first.
/// Runs without any timestamp sort last; equal start times keep first-seen order.
pub fn list_runs(events: &[DelegationEvent]) -> Vec<RunSummary> {
    let mut runs: Vec<RunSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let Some(run_id) = event.run_id() else {
            continue;
        };
        let idx = *index.entry(run_id.to_string()).or_insert_with(|| {
            runs.push(RunSummary::new(run_id));
            runs.len() - 1
        });
        runs[idx].observe(event);
    }

    // Stable sort: ties stay in first-seen order.
    runs.sort_by(|a, b| match (&a.start_time, &b.start_time) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    runs
}

/// The id of the most recently started run, if any.
pub fn latest_run_id(events: &[DelegationEvent]) -> Option<String> {
    list_runs(events).into_iter().next().map(|run| run.run_id)
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn newest_run_first() {
        let events = vec![
            start_in("A", "main", 0, "2026-01-01T00:00:00Z"),
            start_in("B", "main", 0, "2026-01-02T00:00:00Z"),
        ];
        let runs = list_runs(&events);
        let ids: Vec<&str> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(latest_run_id(&events), Some("B".to_string()));
    }

    #[test]
    fn tracks_bounds_and_counts() {
        let events = vec![
            start_in("r1", "main", 0, "2026-01-01T00:00:05Z"),
            start_in("r1", "sub", 1, "2026-01-01T00:00:06Z"),
            end_in("r1", "sub", 1, "2026-01-01T00:00:07Z", 100, false, Some(40), Some(0.5)),
            end_in("r1", "main", 0, "2026-01-01T00:00:09Z", 4000, true, Some(60), None),
            // Out-of-order line from a second writer.
            start_in("r1", "late", 1, "2026-01-01T00:00:01Z"),
        ];
        let runs = list_runs(&events);
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.start_time.as_deref(), Some("2026-01-01T00:00:01Z"));
        assert_eq!(run.end_time.as_deref(), Some("2026-01-01T00:00:09Z"));
        assert_eq!(run.total_delegations, 3);
        assert_eq!(run.completed_delegations, 2);
        assert_eq!(run.failed_delegations, 1);
        assert_eq!(run.total_tokens, 100);
        assert!((run.total_cost_usd - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ignores_events_without_run_id() {
        let mut orphan = start_in("x", "main", 0, "2026-01-03T00:00:00Z");
        if let DelegationEvent::Start(ref mut s) = orphan {
            s.run_id = None;
        }
        let events = vec![orphan, start_in("r1", "main", 0, "2026-01-01T00:00:00Z")];
        let runs = list_runs(&events);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, "r1");
    }

    #[test]
    fn runs_without_timestamp_sort_last() {
        let events = vec![
            start_in("blank", "main", 0, ""),
            start_in("old", "main", 0, "2025-06-01T00:00:00Z"),
        ];
        let runs = list_runs(&events);
        assert_eq!(runs[0].run_id, "old");
        assert_eq!(runs[1].run_id, "blank");
        assert_eq!(runs[1].start_time, None);
    }

    #[test]
    fn empty_log_has_no_runs() {
        assert!(list_runs(&[]).is_empty());
        assert_eq!(latest_run_id(&[]), None);
    }
}
