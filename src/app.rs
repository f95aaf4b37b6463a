use crate::ingest::{DelegationEvent, LogFile, LogRecord};
use crate::runs::{latest_run_id, list_runs, RunSummary};
use crate::stats::{aggregate, summarize, AggregationRow, Dimension, Totals};
use crate::tracking::{active_delegations, build_tree, DelegationNode};

/// Run filter value that selects the newest run in the log.
pub const LATEST: &str = "latest";

/// One snapshot of the delegation log, optionally narrowed to a single run.
///
/// Every query runs against the same snapshot, so a writer appending while
/// the session is open does not change the answers.
pub struct App {
    pub log: LogFile,
    /// Resolved run id; `None` means the whole log.
    pub run_filter: Option<String>,
    records: Vec<LogRecord>,
    events: Vec<DelegationEvent>,
}

impl App {
    pub fn load(log: LogFile, run_filter: Option<String>) -> Self {
        let all = log.read_records();

        let run_filter = match run_filter.as_deref() {
            Some(LATEST) => {
                let events: Vec<DelegationEvent> = all.iter().map(|r| r.event.clone()).collect();
                let latest = latest_run_id(&events);
                if latest.is_none() {
                    tracing::debug!(path = %log.path().display(), "no runs to resolve `latest` against");
                }
                latest
            }
            _ => run_filter,
        };

        let records: Vec<LogRecord> = match run_filter.as_deref() {
            Some(id) => all.into_iter().filter(|r| r.event.run_id() == Some(id)).collect(),
            None => all,
        };
        let events = records.iter().map(|r| r.event.clone()).collect();

        tracing::debug!(
            path = %log.path().display(),
            run = run_filter.as_deref().unwrap_or("*"),
            events = records.len(),
            "loaded delegation log"
        );

        Self {
            log,
            run_filter,
            records,
            events,
        }
    }

    pub fn events(&self) -> &[DelegationEvent] {
        &self.events
    }

    /// Parsed events with their source lines, for verbatim export.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn runs(&self) -> Vec<RunSummary> {
        list_runs(&self.events)
    }

    pub fn tree(&self) -> Vec<DelegationNode> {
        build_tree(&self.events)
    }

    pub fn active(&self) -> Vec<DelegationEvent> {
        active_delegations(&self.events)
    }

    pub fn aggregate(&self, dimension: Dimension) -> Vec<AggregationRow> {
        aggregate(&self.events, dimension, None)
    }

    pub fn summary(&self) -> Totals {
        summarize(&self.events, None)
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
