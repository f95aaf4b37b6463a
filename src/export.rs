//! CSV and JSONL export of a filtered event set.

use std::borrow::Cow;
use std::io::Write;

use color_eyre::eyre::Result;

use crate::ingest::{DelegationEvent, LogRecord};

pub const CSV_HEADER: &str = "run_id,agent_name,model,depth,duration_ms,tokens_used,cost_usd,success,timestamp";

/// Write one CSV row per completed delegation. Start events are not exported.
pub fn write_csv<W: Write>(events: &[DelegationEvent], mut out: W) -> Result<usize> {
    writeln!(out, "{CSV_HEADER}")?;
    let mut rows = 0;
    for end in events.iter().filter_map(DelegationEvent::as_end) {
        let fields = [
            Cow::from(end.run_id.as_deref().unwrap_or("")),
            Cow::from(end.agent_name.as_str()),
            Cow::from(end.model.as_str()),
            Cow::from(end.depth.to_string()),
            Cow::from(end.duration_ms.to_string()),
            end.tokens_used.map_or(Cow::from(""), |t| Cow::from(t.to_string())),
            end.cost_usd.map_or(Cow::from(""), |c| Cow::from(c.to_string())),
            Cow::from(if end.success { "true" } else { "false" }),
            Cow::from(end.timestamp.as_str()),
        ];
        let line: Vec<Cow<str>> = fields.iter().map(|f| csv_field(f)).collect();
        writeln!(out, "{}", line.join(","))?;
        rows += 1;
    }
    out.flush()?;
    Ok(rows)
}

/// Re-emit the source lines unchanged.
pub fn write_jsonl<W: Write>(records: &[LogRecord], mut out: W) -> Result<usize> {
    for record in records {
        writeln!(out, "{}", record.line)?;
    }
    out.flush()?;
    Ok(records.len())
}

/// RFC 4180 minimal quoting: quote only when the field needs it.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
