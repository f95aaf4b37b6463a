//! Grouping and bucketing of completed delegations.
//!
//! Only End events carry outcome data, so every dimension here groups End
//! events. Each [`Dimension`] maps an End event to a group key and owns its
//! sort policy.

pub mod buckets;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use color_eyre::eyre::{bail, Report};

use crate::ingest::{DelegationEnd, DelegationEvent};
use crate::tracking::active_delegations;

pub use buckets::Calendar;

/// Literal event fields usable as a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Agent,
    Model,
    Provider,
    Depth,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Duration,
    Tokens,
    Cost,
    /// Cost per 1000 tokens.
    TokenEfficiency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Model,
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cross {
    AgentModel,
    ProviderModel,
    AgentProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankMetric {
    Cost,
    Success,
    Tokens,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Field(Field),
    Calendar(Calendar),
    Bucket(Bucket),
    Tier(Tier),
    Cross(Cross),
    /// Group by a field, order by a metric (highest first).
    Rank(RankMetric, Field),
}

/// Every dimension name accepted by [`Dimension::from_str`].
pub const DIMENSION_NAMES: &[&str] = &[
    "agent", "model", "provider", "depth", "run",
    "day", "hour", "month", "quarter", "week", "weekday", "day-of-month", "time-of-day",
    "duration", "tokens", "cost", "token-efficiency",
    "model-tier", "provider-tier",
    "agent-model", "provider-model", "agent-provider",
    "cost-rank", "success-rank", "token-rank", "duration-rank",
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKey {
    Single(String),
    Pair(String, String),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Single(key) => write!(f, "{key}"),
            RowKey::Pair(a, b) => write!(f, "{a} × {b}"),
        }
    }
}

/// Totals for one group. Averages and percentages are derived on read.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRow {
    pub key: RowKey,
    pub count: usize,
    pub success_count: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_duration_ms: u64,
}

impl AggregationRow {
    fn new(key: RowKey) -> Self {
        Self {
            key,
            count: 0,
            success_count: 0,
            total_tokens: 0,
            total_cost: 0.0,
            total_duration_ms: 0,
        }
    }

    fn add(&mut self, end: &DelegationEnd) {
        self.count += 1;
        if end.success {
            self.success_count += 1;
        }
        self.total_tokens += end.tokens_used.unwrap_or(0);
        self.total_cost += end.cost_usd.unwrap_or(0.0);
        self.total_duration_ms += end.duration_ms;
    }

    pub fn success_pct(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.count as f64 * 100.0
        }
    }

    pub fn avg_cost(&self) -> Option<f64> {
        self.average(self.total_cost)
    }

    pub fn avg_tokens(&self) -> Option<f64> {
        self.average(self.total_tokens as f64)
    }

    pub fn avg_duration_ms(&self) -> Option<f64> {
        self.average(self.total_duration_ms as f64)
    }

    fn average(&self, total: f64) -> Option<f64> {
        (self.count > 0).then(|| total / self.count as f64)
    }
}

impl Dimension {
    /// Group key for an End event as `(ordinal, key)`, or `None` when the
    /// event cannot be classified along this dimension.
    fn key(&self, end: &DelegationEnd) -> Option<(u32, RowKey)> {
        let single = |(ordinal, label): (u32, &str)| (ordinal, RowKey::Single(label.to_string()));
        let key = match self {
            Dimension::Field(field) | Dimension::Rank(_, field) => field_key(*field, end),
            Dimension::Calendar(calendar) => {
                let (ordinal, label) = buckets::calendar_key(*calendar, &end.timestamp);
                (ordinal, RowKey::Single(label))
            }
            Dimension::Bucket(Bucket::Duration) => single(buckets::duration_bucket(end.duration_ms)),
            Dimension::Bucket(Bucket::Tokens) => {
                single(buckets::tokens_bucket(end.tokens_used.unwrap_or(0)))
            }
            Dimension::Bucket(Bucket::Cost) => single(buckets::cost_bucket(end.cost_usd.unwrap_or(0.0))),
            Dimension::Bucket(Bucket::TokenEfficiency) => {
                single(buckets::efficiency_bucket(end.tokens_used, end.cost_usd)?)
            }
            Dimension::Tier(Tier::Model) => single(buckets::model_tier(&end.model)),
            Dimension::Tier(Tier::Provider) => single(buckets::provider_tier(&end.provider)),
            Dimension::Cross(cross) => {
                let (a, b) = match cross {
                    Cross::AgentModel => (&end.agent_name, &end.model),
                    Cross::ProviderModel => (&end.provider, &end.model),
                    Cross::AgentProvider => (&end.agent_name, &end.provider),
                };
                (0, RowKey::Pair(a.clone(), b.clone()))
            }
        };
        Some(key)
    }

    /// Order rows for presentation. Rows arrive in `(ordinal, key)` order.
    fn sort(&self, rows: &mut [AggregationRow]) {
        match self {
            Dimension::Calendar(_)
            | Dimension::Bucket(_)
            | Dimension::Tier(_)
            | Dimension::Field(Field::Depth) => {}
            Dimension::Field(_) => rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key))),
            Dimension::Cross(_) => {
                rows.sort_by(|a, b| b.total_tokens.cmp(&a.total_tokens).then_with(|| a.key.cmp(&b.key)))
            }
            Dimension::Rank(metric, _) => rows.sort_by(|a, b| {
                metric
                    .compare(b, a)
                    .then_with(|| b.count.cmp(&a.count))
                    .then_with(|| a.key.cmp(&b.key))
            }),
        }
    }
}

impl RankMetric {
    fn compare(&self, a: &AggregationRow, b: &AggregationRow) -> Ordering {
        match self {
            RankMetric::Cost => cmp_f64(a.total_cost, b.total_cost),
            RankMetric::Success => cmp_f64(a.success_pct(), b.success_pct()),
            RankMetric::Tokens => a.total_tokens.cmp(&b.total_tokens),
            RankMetric::Duration => cmp_f64(
                a.avg_duration_ms().unwrap_or(0.0),
                b.avg_duration_ms().unwrap_or(0.0),
            ),
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn field_key(field: Field, end: &DelegationEnd) -> (u32, RowKey) {
    let single = |s: &str| (0, RowKey::Single(s.to_string()));
    match field {
        Field::Agent => single(&end.agent_name),
        Field::Model => single(&end.model),
        Field::Provider => single(&end.provider),
        // Numeric order via the ordinal, so depth 10 follows depth 9.
        Field::Depth => (end.depth, RowKey::Single(end.depth.to_string())),
        Field::Run => single(end.run_id.as_deref().filter(|r| !r.is_empty()).unwrap_or("-")),
    }
}

fn in_scope(event: &DelegationEvent, scope: Option<&str>) -> bool {
    scope.map_or(true, |run_id| event.run_id() == Some(run_id))
}

/// Group the End events in scope along `dimension`.
/// Empty groups never appear; `scope` restricts to a single run id.
pub fn aggregate(
    events: &[DelegationEvent],
    dimension: Dimension,
    scope: Option<&str>,
) -> Vec<AggregationRow> {
    let mut groups: BTreeMap<(u32, RowKey), AggregationRow> = BTreeMap::new();

    for event in events.iter().filter(|e| in_scope(e, scope)) {
        let Some(end) = event.as_end() else {
            continue;
        };
        let Some((ordinal, key)) = dimension.key(end) else {
            continue;
        };
        groups
            .entry((ordinal, key.clone()))
            .or_insert_with(|| AggregationRow::new(key))
            .add(end);
    }

    let mut rows: Vec<AggregationRow> = groups.into_values().collect();
    dimension.sort(&mut rows);
    rows
}

/// Headline numbers for a log or a single run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Totals {
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub active: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_duration_ms: u64,
    pub distinct_agents: usize,
}

impl Totals {
    pub fn success_pct(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.completed as f64 * 100.0
        }
    }

    pub fn avg_duration_ms(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.total_duration_ms as f64 / self.completed as f64)
    }
}

pub fn summarize(events: &[DelegationEvent], scope: Option<&str>) -> Totals {
    let scoped: Vec<DelegationEvent> = events
        .iter()
        .filter(|e| in_scope(e, scope))
        .cloned()
        .collect();

    let mut totals = Totals {
        active: active_delegations(&scoped).len(),
        ..Totals::default()
    };
    let mut agents: HashSet<&str> = HashSet::new();

    for event in &scoped {
        agents.insert(event.agent_name());
        let Some(end) = event.as_end() else {
            continue;
        };
        totals.completed += 1;
        if end.success {
            totals.succeeded += 1;
        } else {
            totals.failed += 1;
        }
        totals.total_tokens += end.tokens_used.unwrap_or(0);
        totals.total_cost += end.cost_usd.unwrap_or(0.0);
        totals.total_duration_ms += end.duration_ms;
    }
    totals.distinct_agents = agents.len();
    totals
}

impl FromStr for Dimension {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '×'], "-");
        if let Some((metric, field)) = normalized.split_once(':') {
            let Ok(Dimension::Rank(metric, _)) = metric.parse::<Dimension>() else {
                bail!("only rank dimensions take a field: {s}");
            };
            let Ok(Dimension::Field(field)) = field.parse::<Dimension>() else {
                bail!("unknown rank field in {s}; expected agent, model, provider, depth or run");
            };
            return Ok(Dimension::Rank(metric, field));
        }

        let dimension = match normalized.as_str() {
            "agent" => Dimension::Field(Field::Agent),
            "model" => Dimension::Field(Field::Model),
            "provider" => Dimension::Field(Field::Provider),
            "depth" => Dimension::Field(Field::Depth),
            "run" | "run-id" => Dimension::Field(Field::Run),
            "day" => Dimension::Calendar(Calendar::Day),
            "hour" => Dimension::Calendar(Calendar::Hour),
            "month" => Dimension::Calendar(Calendar::Month),
            "quarter" => Dimension::Calendar(Calendar::Quarter),
            "week" => Dimension::Calendar(Calendar::Week),
            "weekday" => Dimension::Calendar(Calendar::Weekday),
            "day-of-month" => Dimension::Calendar(Calendar::DayOfMonth),
            "time-of-day" => Dimension::Calendar(Calendar::TimeOfDay),
            "duration" => Dimension::Bucket(Bucket::Duration),
            "tokens" => Dimension::Bucket(Bucket::Tokens),
            "cost" => Dimension::Bucket(Bucket::Cost),
            "token-efficiency" => Dimension::Bucket(Bucket::TokenEfficiency),
            "model-tier" => Dimension::Tier(Tier::Model),
            "provider-tier" => Dimension::Tier(Tier::Provider),
            "agent-model" => Dimension::Cross(Cross::AgentModel),
            "provider-model" => Dimension::Cross(Cross::ProviderModel),
            "agent-provider" => Dimension::Cross(Cross::AgentProvider),
            "cost-rank" => Dimension::Rank(RankMetric::Cost, Field::Agent),
            "success-rank" => Dimension::Rank(RankMetric::Success, Field::Agent),
            "token-rank" => Dimension::Rank(RankMetric::Tokens, Field::Agent),
            "duration-rank" => Dimension::Rank(RankMetric::Duration, Field::Agent),
            _ => bail!("unknown dimension {s:?}; expected one of: {}", DIMENSION_NAMES.join(", ")),
        };
        Ok(dimension)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Agent => "agent",
            Field::Model => "model",
            Field::Provider => "provider",
            Field::Depth => "depth",
            Field::Run => "run",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Field(field) => return write!(f, "{field}"),
            Dimension::Calendar(Calendar::Day) => "day",
            Dimension::Calendar(Calendar::Hour) => "hour",
            Dimension::Calendar(Calendar::Month) => "month",
            Dimension::Calendar(Calendar::Quarter) => "quarter",
            Dimension::Calendar(Calendar::Week) => "week",
            Dimension::Calendar(Calendar::Weekday) => "weekday",
            Dimension::Calendar(Calendar::DayOfMonth) => "day-of-month",
            Dimension::Calendar(Calendar::TimeOfDay) => "time-of-day",
            Dimension::Bucket(Bucket::Duration) => "duration",
            Dimension::Bucket(Bucket::Tokens) => "tokens",
            Dimension::Bucket(Bucket::Cost) => "cost",
            Dimension::Bucket(Bucket::TokenEfficiency) => "token-efficiency",
            Dimension::Tier(Tier::Model) => "model-tier",
            Dimension::Tier(Tier::Provider) => "provider-tier",
            Dimension::Cross(Cross::AgentModel) => "agent-model",
            Dimension::Cross(Cross::ProviderModel) => "provider-model",
            Dimension::Cross(Cross::AgentProvider) => "agent-provider",
            Dimension::Rank(metric, field) => {
                let metric = match metric {
                    RankMetric::Cost => "cost-rank",
                    RankMetric::Success => "success-rank",
                    RankMetric::Tokens => "token-rank",
                    RankMetric::Duration => "duration-rank",
                };
                return match field {
                    Field::Agent => write!(f, "{metric}"),
                    other => write!(f, "{metric}:{other}"),
                };
            }
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;

    fn keys(rows: &[AggregationRow]) -> Vec<String> {
        rows.iter().map(|r| r.key.to_string()).collect()
    }

    fn sample() -> Vec<DelegationEvent> {
        vec![
            start("a", 0, "2026-01-01T00:00:00Z"),
            start("b", 1, "2026-01-01T00:00:01Z"),
            end_in("r1", "b", 1, "2026-01-01T00:00:02Z", 500, true, Some(100), Some(0.01)),
            end("a", 0, "2026-01-01T00:00:03Z", 2000),
        ]
    }

    #[test]
    fn bucket_counts_cover_every_end_event() {
        let events = vec![
            end_in("r1", "a", 0, "2026-01-01T01:00:00Z", 10, true, Some(5), Some(0.0001)),
            end_in("r1", "b", 1, "2026-02-01T13:00:00Z", 900, false, None, None),
            end_in("r2", "c", 2, "garbage", 70_000, true, Some(250_000), Some(3.0)),
            start("a", 0, "2026-01-01T00:00:00Z"),
        ];
        let bucketed = [
            Dimension::Bucket(Bucket::Duration),
            Dimension::Bucket(Bucket::Tokens),
            Dimension::Bucket(Bucket::Cost),
            Dimension::Calendar(Calendar::Day),
            Dimension::Calendar(Calendar::Week),
            Dimension::Calendar(Calendar::TimeOfDay),
            Dimension::Tier(Tier::Model),
            Dimension::Field(Field::Depth),
        ];
        for dimension in bucketed {
            let rows = aggregate(&events, dimension, None);
            let total: usize = rows.iter().map(|r| r.count).sum();
            assert_eq!(total, 3, "{dimension}");
            assert!(rows.iter().all(|r| r.count > 0));
        }
    }

    #[test]
    fn tree_scenario_buckets() {
        let events = sample();
        let tokens = aggregate(&events, Dimension::Bucket(Bucket::Tokens), None);
        assert_eq!(keys(&tokens), vec!["0–99", "100–999"]);
        assert_eq!(tokens[1].count, 1);

        let durations = aggregate(&events, Dimension::Bucket(Bucket::Duration), None);
        assert_eq!(keys(&durations), vec!["500ms–2s", "2s–10s"]);
        assert!(durations.iter().all(|r| r.count == 1));
    }

    #[test]
    fn numeric_buckets_sort_by_ordinal_not_label() {
        let events = vec![
            end("x", 0, "2026-01-01T00:00:00Z", 70_000),
            end("x", 0, "2026-01-01T00:00:00Z", 100),
            end("x", 0, "2026-01-01T00:00:00Z", 3_000),
        ];
        let rows = aggregate(&events, Dimension::Bucket(Bucket::Duration), None);
        assert_eq!(keys(&rows), vec!["<500ms", "2s–10s", "≥60s"]);
    }

    #[test]
    fn calendar_rows_are_chronological_with_unknown_last() {
        let events = vec![
            end("x", 0, "2026-03-01T00:00:00Z", 1),
            end("x", 0, "nope", 1),
            end("x", 0, "2025-12-31T00:00:00Z", 1),
            end("x", 0, "2026-01-15T00:00:00Z", 1),
        ];
        let rows = aggregate(&events, Dimension::Calendar(Calendar::Month), None);
        assert_eq!(keys(&rows), vec!["2025-12", "2026-01", "2026-03", "unknown"]);
    }

    #[test]
    fn weekday_rows_start_on_monday() {
        let events = vec![
            end("x", 0, "2026-02-22T10:00:00Z", 1), // Sunday
            end("x", 0, "2026-02-16T10:00:00Z", 1), // Monday
            end("x", 0, "2026-02-18T10:00:00Z", 1), // Wednesday
        ];
        let rows = aggregate(&events, Dimension::Calendar(Calendar::Weekday), None);
        assert_eq!(keys(&rows), vec!["Monday", "Wednesday", "Sunday"]);
    }

    #[test]
    fn depth_sorts_numerically() {
        let events = vec![
            end("x", 10, "2026-01-01T00:00:00Z", 1),
            end("x", 9, "2026-01-01T00:00:00Z", 1),
            end("x", 9, "2026-01-01T00:00:00Z", 1),
        ];
        let rows = aggregate(&events, Dimension::Field(Field::Depth), None);
        assert_eq!(keys(&rows), vec!["9", "10"]);
    }

    #[test]
    fn literal_fields_sort_by_count_then_key() {
        let events = vec![
            end("zeta", 0, "2026-01-01T00:00:00Z", 1),
            end("alpha", 0, "2026-01-01T00:00:00Z", 1),
            end("mid", 0, "2026-01-01T00:00:00Z", 1),
            end("mid", 0, "2026-01-01T00:00:00Z", 1),
        ];
        let rows = aggregate(&events, Dimension::Field(Field::Agent), None);
        assert_eq!(keys(&rows), vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn success_rank_tie_breaks() {
        let events = vec![
            end_in("r1", "b", 0, "t", 1, true, None, None),
            end_in("r1", "a", 0, "t", 1, true, None, None),
            end_in("r1", "c", 0, "t", 1, true, None, None),
            end_in("r1", "c", 0, "t", 1, true, None, None),
            end_in("r1", "d", 0, "t", 1, false, None, None),
            end_in("r1", "d", 0, "t", 1, true, None, None),
        ];
        let rows = aggregate(&events, Dimension::Rank(RankMetric::Success, Field::Agent), None);
        // 100%: c (2 calls) before a, b (1 call, alphabetical); then d at 50%.
        assert_eq!(keys(&rows), vec!["c", "a", "b", "d"]);
        assert_eq!(rows[3].success_pct(), 50.0);
    }

    #[test]
    fn cost_rank_by_run_finds_most_expensive_run() {
        let events = vec![
            end_in("cheap", "a", 0, "t", 1, true, Some(10), Some(0.01)),
            end_in("pricey", "a", 0, "t", 1, true, Some(10), Some(0.40)),
            end_in("pricey", "b", 1, "t", 1, true, Some(10), Some(0.20)),
        ];
        let rows = aggregate(&events, "cost-rank:run".parse().unwrap(), None);
        assert_eq!(keys(&rows), vec!["pricey", "cheap"]);
        assert!((rows[0].total_cost - 0.60).abs() < 1e-9);
    }

    #[test]
    fn duration_rank_uses_average() {
        let events = vec![
            end("fast", 0, "t", 100),
            end("fast", 0, "t", 100),
            end("fast", 0, "t", 100),
            end("slow", 0, "t", 250),
        ];
        let rows = aggregate(&events, Dimension::Rank(RankMetric::Duration, Field::Agent), None);
        assert_eq!(keys(&rows), vec!["slow", "fast"]);
        assert_eq!(rows[1].avg_duration_ms(), Some(100.0));
    }

    #[test]
    fn cross_product_sorts_by_tokens_then_components() {
        let events = vec![
            with_model(end_in("r1", "b", 0, "t", 1, true, Some(50), None), "anthropic", "haiku"),
            with_model(end_in("r1", "a", 0, "t", 1, true, Some(50), None), "anthropic", "sonnet"),
            with_model(end_in("r1", "a", 0, "t", 1, true, Some(50), None), "anthropic", "haiku"),
            with_model(end_in("r1", "c", 0, "t", 1, true, Some(900), None), "openai", "gpt-4o"),
        ];
        let rows = aggregate(&events, Dimension::Cross(Cross::AgentModel), None);
        assert_eq!(
            keys(&rows),
            vec!["c × gpt-4o", "a × haiku", "a × sonnet", "b × haiku"]
        );
        assert_eq!(rows[1].key, RowKey::Pair("a".into(), "haiku".into()));
    }

    #[test]
    fn provider_model_sorts_by_tokens_then_components() {
        let events = vec![
            with_model(end_in("r1", "a", 0, "t", 1, true, Some(10), None), "openai", "gpt-4o"),
            with_model(end_in("r1", "b", 0, "t", 1, true, Some(10), None), "anthropic", "sonnet"),
            with_model(end_in("r1", "c", 0, "t", 1, true, Some(10), None), "anthropic", "haiku"),
            with_model(end_in("r1", "d", 0, "t", 1, true, Some(500), None), "google", "gemini"),
            with_model(end_in("r1", "e", 0, "t", 1, true, Some(5), None), "anthropic", "haiku"),
        ];
        let rows = aggregate(&events, Dimension::Cross(Cross::ProviderModel), None);
        assert_eq!(
            keys(&rows),
            vec!["google × gemini", "anthropic × haiku", "anthropic × sonnet", "openai × gpt-4o"]
        );
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].total_tokens, 15);
    }

    #[test]
    fn agent_provider_sorts_by_tokens_then_components() {
        let events = vec![
            with_model(end_in("r1", "writer", 0, "t", 1, true, Some(40), None), "openai", "m"),
            with_model(end_in("r1", "reader", 0, "t", 1, true, Some(40), None), "openai", "m"),
            with_model(end_in("r1", "reader", 0, "t", 1, true, Some(40), None), "anthropic", "m"),
            with_model(end_in("r1", "writer", 0, "t", 1, false, None, None), "anthropic", "m"),
        ];
        let rows = aggregate(&events, Dimension::Cross(Cross::AgentProvider), None);
        assert_eq!(
            keys(&rows),
            vec!["reader × anthropic", "reader × openai", "writer × openai", "writer × anthropic"]
        );
        assert_eq!(rows[3].total_tokens, 0);
        assert_eq!(rows[3].success_count, 0);
    }

    #[test]
    fn scope_limits_to_one_run() {
        let events = vec![
            end_in("r1", "a", 0, "t", 1, true, None, None),
            end_in("r2", "a", 0, "t", 1, true, None, None),
            end_in("r2", "a", 0, "t", 1, false, None, None),
        ];
        let rows = aggregate(&events, Dimension::Field(Field::Agent), Some("r2"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].success_count, 1);
        assert!(aggregate(&events, Dimension::Field(Field::Agent), Some("r9")).is_empty());
    }

    #[test]
    fn token_efficiency_skips_unclassifiable_events() {
        let events = vec![
            end_in("r1", "a", 0, "t", 1, true, Some(1000), Some(0.005)),
            end_in("r1", "a", 0, "t", 1, true, None, Some(0.005)),
        ];
        let rows = aggregate(&events, Dimension::Bucket(Bucket::TokenEfficiency), None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 1);
    }

    #[test]
    fn derived_fields_on_empty_row() {
        let row = AggregationRow::new(RowKey::Single("x".into()));
        assert_eq!(row.success_pct(), 0.0);
        assert_eq!(row.avg_cost(), None);
        assert_eq!(row.avg_tokens(), None);
        assert_eq!(row.avg_duration_ms(), None);
    }

    #[test]
    fn summarize_counts_active_and_outcomes() {
        let mut events = sample();
        events.push(start("c", 1, "2026-01-01T00:00:04Z"));
        events.push(end_in("r1", "d", 1, "2026-01-01T00:00:05Z", 10, false, None, Some(0.5)));
        let totals = summarize(&events, None);
        assert_eq!(totals.completed, 3);
        assert_eq!(totals.succeeded, 2);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.active, 1);
        assert_eq!(totals.total_tokens, 100);
        assert!((totals.total_cost - 0.51).abs() < 1e-9);
        assert_eq!(totals.distinct_agents, 4);
        assert_eq!(summarize(&events, Some("nope")), Totals::default());
    }

    #[test]
    fn dimension_names_round_trip() {
        for name in DIMENSION_NAMES {
            let dimension: Dimension = name.parse().unwrap();
            assert_eq!(dimension.to_string(), *name);
        }
        assert_eq!(
            "duration-rank:model".parse::<Dimension>().unwrap(),
            Dimension::Rank(RankMetric::Duration, Field::Model)
        );
        assert_eq!("Agent×Model".parse::<Dimension>().unwrap(), Dimension::Cross(Cross::AgentModel));
        assert!("colour".parse::<Dimension>().is_err());
        assert!("day:agent".parse::<Dimension>().is_err());
        assert!("cost-rank:hour".parse::<Dimension>().is_err());
    }
}
