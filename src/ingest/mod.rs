pub mod jsonl;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use jsonl::{parse_jsonl_line, LogFile, LogRecord};

/// One line of the delegation log, discriminated by `event_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum DelegationEvent {
    #[serde(rename = "DelegationStart")]
    Start(DelegationStart),
    #[serde(rename = "DelegationEnd")]
    End(DelegationEnd),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationStart {
    #[serde(default)]
    pub run_id: Option<String>,
    pub agent_name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub agentic: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationEnd {
    #[serde(default)]
    pub run_id: Option<String>,
    pub agent_name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub agentic: bool,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    pub timestamp: String,
}

impl DelegationEvent {
    pub fn is_start(&self) -> bool {
        matches!(self, DelegationEvent::Start(_))
    }

    /// The run id, treating an empty string the same as an absent one.
    pub fn run_id(&self) -> Option<&str> {
        let run_id = match self {
            DelegationEvent::Start(s) => s.run_id.as_deref(),
            DelegationEvent::End(e) => e.run_id.as_deref(),
        };
        run_id.filter(|id| !id.is_empty())
    }

    pub fn agent_name(&self) -> &str {
        match self {
            DelegationEvent::Start(s) => &s.agent_name,
            DelegationEvent::End(e) => &e.agent_name,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            DelegationEvent::Start(s) => &s.provider,
            DelegationEvent::End(e) => &e.provider,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            DelegationEvent::Start(s) => &s.model,
            DelegationEvent::End(e) => &e.model,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            DelegationEvent::Start(s) => s.depth,
            DelegationEvent::End(e) => e.depth,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            DelegationEvent::Start(s) => &s.timestamp,
            DelegationEvent::End(e) => &e.timestamp,
        }
    }

    pub fn as_end(&self) -> Option<&DelegationEnd> {
        match self {
            DelegationEvent::End(e) => Some(e),
            DelegationEvent::Start(_) => None,
        }
    }
}

/// Parse an ISO-8601 timestamp. Offset-less values are read as UTC.
/// Returns `None` for anything unparseable; callers treat that as "absent".
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Sort key for a raw timestamp.
///
/// Parseable values order by instant and come before every unparseable one;
/// unparseable values order by their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeKey<'a> {
    Parsed(DateTime<Utc>),
    Raw(&'a str),
}

impl<'a> TimeKey<'a> {
    pub fn new(raw: &'a str) -> Self {
        match parse_timestamp(raw) {
            Some(dt) => TimeKey::Parsed(dt),
            None => TimeKey::Raw(raw),
        }
    }
}
