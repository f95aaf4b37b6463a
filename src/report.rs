//! Plain-text rendering of query results for the command line.

use crate::ingest::DelegationEvent;
use crate::runs::RunSummary;
use crate::stats::{AggregationRow, Dimension, Totals};
use crate::tracking::{DelegationNode, NodeStatus};

/// Trait for formatting query results.
/// Implement this trait to add new output formats.
pub trait ReportFormatter {
    fn rows(&self, dimension: Dimension, rows: &[AggregationRow]) -> String;
    fn runs(&self, runs: &[RunSummary]) -> String;
    fn tree(&self, forest: &[DelegationNode]) -> String;
    fn active(&self, active: &[DelegationEvent]) -> String;
    fn totals(&self, scope: Option<&str>, totals: &Totals) -> String;
}

/// Text table formatter for terminal output.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    /// Minimum width for the key column.
    pub min_key_width: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { min_key_width: 16 }
    }
}

impl ReportFormatter for TextFormatter {
    fn rows(&self, dimension: Dimension, rows: &[AggregationRow]) -> String {
        if rows.is_empty() {
            return format!("No completed delegations for {dimension}.\n");
        }
        let keys: Vec<String> = rows.iter().map(|r| r.key.to_string()).collect();
        let width = keys
            .iter()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.min_key_width)
            .max(dimension.to_string().len());

        let mut output = String::new();
        output.push_str(&format!(
            "{:<width$} {:>7} {:>6} {:>10} {:>10} {:>10}\n",
            dimension.to_string(),
            "Count",
            "OK%",
            "Tokens",
            "Cost",
            "Avg ms",
            width = width
        ));
        output.push_str(&"─".repeat(width + 48));
        output.push('\n');

        for (key, row) in keys.iter().zip(rows) {
            let pad = width.saturating_sub(key.chars().count());
            output.push_str(&format!(
                "{}{} {:>7} {:>5.0}% {:>10} {:>10} {:>10}\n",
                key,
                " ".repeat(pad),
                row.count,
                row.success_pct(),
                row.total_tokens,
                format!("${:.4}", row.total_cost),
                row.avg_duration_ms().map_or("-".to_string(), |ms| format!("{ms:.0}")),
            ));
        }
        output
    }

    fn runs(&self, runs: &[RunSummary]) -> String {
        if runs.is_empty() {
            return "No runs recorded.\n".to_string();
        }
        let width = runs
            .iter()
            .map(|r| r.run_id.len())
            .max()
            .unwrap_or(0)
            .max(6);

        let mut output = format!(
            "{:<width$} {:<24} {:>6} {:>6} {:>10} {:>10}\n",
            "Run",
            "Started",
            "Calls",
            "Failed",
            "Tokens",
            "Cost",
            width = width
        );
        for run in runs {
            output.push_str(&format!(
                "{:<width$} {:<24} {:>6} {:>6} {:>10} {:>10}\n",
                run.run_id,
                run.start_time.as_deref().unwrap_or("-"),
                run.total_delegations,
                run.failed_delegations,
                run.total_tokens,
                format!("${:.4}", run.total_cost_usd),
                width = width
            ));
        }
        output
    }

    fn tree(&self, forest: &[DelegationNode]) -> String {
        if forest.is_empty() {
            return "No delegations recorded.\n".to_string();
        }
        let mut output = String::new();
        for root in forest {
            write_node(root, 0, &mut output);
        }
        output
    }

    fn active(&self, active: &[DelegationEvent]) -> String {
        if active.is_empty() {
            return "No delegations in flight.\n".to_string();
        }
        let mut output = String::new();
        for event in active {
            output.push_str(&format!(
                "{}  {}{} [{}] run={}\n",
                event.timestamp(),
                "  ".repeat(event.depth() as usize),
                event.agent_name(),
                event.model(),
                event.run_id().unwrap_or("-"),
            ));
        }
        output
    }

    fn totals(&self, scope: Option<&str>, totals: &Totals) -> String {
        let mut output = format!("Summary (run: {})\n", scope.unwrap_or("all"));
        output.push_str(&format!("  Completed : {}\n", totals.completed));
        output.push_str(&format!(
            "  Succeeded : {} ({:.0}%)\n",
            totals.succeeded,
            totals.success_pct()
        ));
        output.push_str(&format!("  Failed    : {}\n", totals.failed));
        output.push_str(&format!("  In flight : {}\n", totals.active));
        output.push_str(&format!("  Agents    : {}\n", totals.distinct_agents));
        output.push_str(&format!("  Tokens    : {}\n", totals.total_tokens));
        output.push_str(&format!("  Cost      : ${:.4}\n", totals.total_cost));
        if let Some(avg) = totals.avg_duration_ms() {
            output.push_str(&format!("  Avg ms    : {avg:.0}\n"));
        }
        output
    }
}

fn write_node(node: &DelegationNode, indent: usize, output: &mut String) {
    let status = match node.status() {
        NodeStatus::Running => "…".to_string(),
        NodeStatus::Succeeded => "✓".to_string(),
        NodeStatus::Failed => "✗".to_string(),
    };
    let mut line = format!("{}{} {} [{}]", "  ".repeat(indent), status, node.agent_name, node.model);
    if let Some(ms) = node.duration_ms {
        line.push_str(&format!(" {ms}ms"));
    }
    if let Some(tokens) = node.tokens_used {
        line.push_str(&format!(" {tokens} tok"));
    }
    if let Some(cost) = node.cost_usd {
        line.push_str(&format!(" ${cost:.4}"));
    }
    if let Some(ref err) = node.error_message {
        line.push_str(&format!(" error=\"{err}\""));
    }
    output.push_str(&line);
    output.push('\n');
    for child in &node.children {
        write_node(child, indent + 1, output);
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
