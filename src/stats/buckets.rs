//! Group-key functions for calendar, numeric and tier dimensions.
//!
//! Every function returns `(ordinal, label)`. The ordinal gives the natural
//! ascending order of the buckets; labels that already sort naturally
//! (zero-padded calendar strings) share an ordinal and fall back to
//! lexicographic order.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::ingest::parse_timestamp;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
    Day,
    Hour,
    Month,
    Quarter,
    Week,
    Weekday,
    DayOfMonth,
    TimeOfDay,
}

/// Calendar bucket for a raw timestamp. Unparseable timestamps land in
/// [`UNKNOWN`], which sorts after every real bucket.
pub fn calendar_key(calendar: Calendar, timestamp: &str) -> (u32, String) {
    match parse_timestamp(timestamp) {
        Some(dt) => calendar_bucket(calendar, &dt),
        None => (u32::MAX, UNKNOWN.to_string()),
    }
}

fn calendar_bucket(calendar: Calendar, dt: &DateTime<Utc>) -> (u32, String) {
    match calendar {
        Calendar::Day => (0, dt.format("%Y-%m-%d").to_string()),
        Calendar::Hour => (0, format!("{:02}", dt.hour())),
        Calendar::Month => (0, dt.format("%Y-%m").to_string()),
        Calendar::Quarter => (0, format!("{}-Q{}", dt.year(), (dt.month() - 1) / 3 + 1)),
        Calendar::Week => {
            let week = dt.iso_week();
            (0, format!("{}-W{:02}", week.year(), week.week()))
        }
        Calendar::Weekday => {
            let day = dt.weekday();
            (day.num_days_from_monday(), weekday_name(day).to_string())
        }
        Calendar::DayOfMonth => (0, format!("{:02}", dt.day())),
        Calendar::TimeOfDay => {
            let (ordinal, label) = time_of_day(dt.hour());
            (ordinal, label.to_string())
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn time_of_day(hour: u32) -> (u32, &'static str) {
    match hour {
        0..=5 => (0, "night"),
        6..=11 => (1, "morning"),
        12..=17 => (2, "afternoon"),
        _ => (3, "evening"),
    }
}

pub fn duration_bucket(duration_ms: u64) -> (u32, &'static str) {
    match duration_ms {
        0..=499 => (0, "<500ms"),
        500..=1_999 => (1, "500ms–2s"),
        2_000..=9_999 => (2, "2s–10s"),
        10_000..=59_999 => (3, "10s–60s"),
        _ => (4, "≥60s"),
    }
}

pub fn tokens_bucket(tokens: u64) -> (u32, &'static str) {
    match tokens {
        0..=99 => (0, "0–99"),
        100..=999 => (1, "100–999"),
        1_000..=9_999 => (2, "1000–9999"),
        10_000..=99_999 => (3, "10000–99999"),
        _ => (4, "≥100000"),
    }
}

pub fn cost_bucket(cost_usd: f64) -> (u32, &'static str) {
    if cost_usd < 0.001 {
        (0, "<$0.001")
    } else if cost_usd < 0.01 {
        (1, "$0.001–0.01")
    } else if cost_usd < 0.10 {
        (2, "$0.01–0.10")
    } else if cost_usd < 1.00 {
        (3, "$0.10–1.00")
    } else {
        (4, "≥$1.00")
    }
}

/// Cost per 1000 tokens. `None` unless both tokens (> 0) and cost are known.
pub fn efficiency_bucket(tokens: Option<u64>, cost_usd: Option<f64>) -> Option<(u32, &'static str)> {
    let tokens = tokens.filter(|t| *t > 0)?;
    let per_thousand = cost_usd? / tokens as f64 * 1000.0;
    let bucket = if per_thousand < 0.002 {
        (0, "<$0.002/1k")
    } else if per_thousand < 0.008 {
        (1, "$0.002–0.008/1k")
    } else if per_thousand < 0.02 {
        (2, "$0.008–0.02/1k")
    } else {
        (3, "≥$0.02/1k")
    };
    Some(bucket)
}

pub fn model_tier(model: &str) -> (u32, &'static str) {
    let model = model.to_lowercase();
    if model.contains("haiku") {
        (0, "haiku")
    } else if model.contains("sonnet") {
        (1, "sonnet")
    } else if model.contains("opus") {
        (2, "opus")
    } else {
        (3, "other")
    }
}

pub fn provider_tier(provider: &str) -> (u32, &'static str) {
    let provider = provider.to_lowercase();
    if provider.contains("anthropic") || provider.contains("claude") {
        (0, "anthropic")
    } else if provider.contains("openai") || provider.contains("azure") {
        (1, "openai")
    } else if provider.contains("google") || provider.contains("gemini") || provider.contains("vertex") {
        (2, "google")
    } else if ["ollama", "lmstudio", "llama", "local"].iter().any(|p| provider.contains(p)) {
        (3, "local")
    } else {
        (4, "other")
    }
}
