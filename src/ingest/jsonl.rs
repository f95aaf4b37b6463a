use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::DelegationEvent;

/// A parsed event together with the exact line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub line: String,
    pub event: DelegationEvent,
}

/// Handle to the append-only delegation log.
///
/// Holds only the path; every read opens the file afresh so concurrent
/// writers appending to it are never blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every parseable event, optionally keeping only one run.
    pub fn read_events(&self, run_id: Option<&str>) -> Vec<DelegationEvent> {
        self.read_records()
            .into_iter()
            .map(|record| record.event)
            .filter(|event| run_id.is_none() || event.run_id() == run_id)
            .collect()
    }

    /// Read every parseable line along with its source text, in file order.
    /// A missing or unreadable file yields no records.
    pub fn read_records(&self) -> Vec<LogRecord> {
        match self.try_read_records() {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "cannot read delegation log");
                Vec::new()
            }
        }
    }

    /// Like [`LogFile::read_records`], but any I/O failure other than a
    /// missing file is returned instead of being absorbed.
    pub fn try_read_records(&self) -> io::Result<Vec<LogRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        parse_records(BufReader::new(file))
    }
}

/// Parse records from any line source. Lines that are not valid events,
/// including lines that are not UTF-8, are skipped.
pub fn read_records_from<R: BufRead>(reader: R) -> Vec<LogRecord> {
    parse_records(reader).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "log read stopped early");
        Vec::new()
    })
}

fn parse_records<R: BufRead>(reader: R) -> io::Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for raw in reader.split(b'\n') {
        let raw = raw?;
        let Ok(line) = std::str::from_utf8(&raw) else {
            skipped += 1;
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_jsonl_line(trimmed) {
            Some(event) => records.push(LogRecord {
                line: trimmed.to_string(),
                event,
            }),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, parsed = records.len(), "skipped malformed log lines");
    }
    Ok(records)
}

/// Parse a single JSONL line into a delegation event.
pub fn parse_jsonl_line(line: &str) -> Option<DelegationEvent> {
    serde_json::from_str(line).ok()
}
