//! Bounding the log to the most recent runs.
//!
//! The rewrite goes through a sibling temp file and a rename, so readers see
//! either the old log or the new one, never a truncated file. Lines appended
//! by a writer between the read and the rename are lost. Callers must not run
//! two prunes against the same file at once.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};

use crate::ingest::{LogFile, LogRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneResult {
    pub pruned_runs: usize,
    pub removed_events: usize,
    pub kept_events: usize,
}

/// Keep only the `keep` most recently started runs in the log.
///
/// Events without a run id are always kept. Malformed lines, including lines
/// that are not UTF-8, are not carried over to the rewritten file. An I/O
/// error while reading leaves the file untouched. When the log already holds `keep` runs or fewer
/// the file is left untouched.
pub fn prune(log_path: &Path, keep: usize) -> Result<PruneResult> {
    // A failed read must not be mistaken for a short log and rewritten.
    let records = LogFile::new(log_path)
        .try_read_records()
        .wrap_err_with(|| format!("Failed to read {}", log_path.display()))?;
    let doomed = runs_to_prune(&records, keep);

    if doomed.is_empty() {
        return Ok(PruneResult {
            kept_events: records.len(),
            ..PruneResult::default()
        });
    }

    let (removed, kept): (Vec<&LogRecord>, Vec<&LogRecord>) = records
        .iter()
        .partition(|r| r.event.run_id().is_some_and(|id| doomed.contains(id)));

    replace_atomically(log_path, &kept)?;

    let result = PruneResult {
        pruned_runs: doomed.len(),
        removed_events: removed.len(),
        kept_events: kept.len(),
    };
    tracing::info!(
        path = %log_path.display(),
        pruned_runs = result.pruned_runs,
        removed_events = result.removed_events,
        kept_events = result.kept_events,
        "pruned delegation log"
    );
    Ok(result)
}

/// Run ids beyond the `keep` newest, ordered by each run's earliest timestamp.
fn runs_to_prune(records: &[LogRecord], keep: usize) -> HashSet<&str> {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut earliest: HashMap<&str, &str> = HashMap::new();

    for record in records {
        let Some(run_id) = record.event.run_id() else {
            continue;
        };
        let ts = record.event.timestamp();
        match earliest.get_mut(run_id) {
            Some(cur) => {
                if ts < *cur {
                    *cur = ts;
                }
            }
            None => {
                first_seen.push(run_id);
                earliest.insert(run_id, ts);
            }
        }
    }

    if first_seen.len() <= keep {
        return HashSet::new();
    }

    // Stable: runs with the same start keep first-seen order.
    first_seen.sort_by(|a, b| earliest[b].cmp(&earliest[a]));
    first_seen.into_iter().skip(keep).collect()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "delegations.jsonl".to_string());
    path.with_file_name(format!(".{name}.prune.tmp"))
}

fn replace_atomically(path: &Path, records: &[&LogRecord]) -> Result<()> {
    let tmp_path = temp_sibling(path);

    let write = || -> Result<()> {
        let file = File::create(&tmp_path)
            .wrap_err_with(|| format!("Failed to create {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in records {
            writeln!(writer, "{}", record.line)
                .wrap_err_with(|| format!("Failed to write {}", tmp_path.display()))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .wrap_err_with(|| format!("Failed to flush {}", tmp_path.display()))?;
        file.sync_all()
            .wrap_err_with(|| format!("Failed to sync {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .wrap_err_with(|| format!("Failed to replace {}", path.display()))
    };

    let outcome = write();
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    outcome
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
