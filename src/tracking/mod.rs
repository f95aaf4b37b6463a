pub mod active;
pub mod matching;
pub mod tree;

use std::fmt;

use crate::ingest::{DelegationEnd, DelegationStart};

pub use active::active_delegations;
pub use matching::{MatchStrategy, Pairing};
pub use tree::build_tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Running,
    Succeeded,
    Failed,
}

impl NodeStatus {
    pub fn is_complete(&self) -> bool {
        !matches!(self, NodeStatus::Running)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Running => write!(f, "running"),
            NodeStatus::Succeeded => write!(f, "ok"),
            NodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A single reconstructed delegation and the delegations it spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct DelegationNode {
    pub agent_name: String,
    pub provider: String,
    pub model: String,
    pub depth: u32,
    pub run_id: Option<String>,
    pub agentic: bool,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_ms: Option<u64>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
    pub tokens_used: Option<u64>,
    pub cost_usd: Option<f64>,
    pub children: Vec<DelegationNode>,
}

impl DelegationNode {
    /// A Running node for a Start event.
    pub fn from_start(start: &DelegationStart) -> Self {
        Self {
            agent_name: start.agent_name.clone(),
            provider: start.provider.clone(),
            model: start.model.clone(),
            depth: start.depth,
            run_id: start.run_id.clone(),
            agentic: start.agentic,
            start_time: start.timestamp.clone(),
            end_time: None,
            duration_ms: None,
            success: None,
            error_message: None,
            tokens_used: None,
            cost_usd: None,
            children: Vec::new(),
        }
    }

    /// Record the matching End event. A node that is already complete is left as is.
    pub fn complete(&mut self, end: &DelegationEnd) {
        if self.status().is_complete() {
            return;
        }
        self.end_time = Some(end.timestamp.clone());
        self.duration_ms = Some(end.duration_ms);
        self.success = Some(end.success);
        self.error_message = end.error_message.clone();
        self.tokens_used = end.tokens_used;
        self.cost_usd = end.cost_usd;
    }

    pub fn status(&self) -> NodeStatus {
        match self.success {
            None => NodeStatus::Running,
            Some(true) => NodeStatus::Succeeded,
            Some(false) => NodeStatus::Failed,
        }
    }

    /// This node plus all descendants.
    pub fn total_nodes(&self) -> usize {
        1 + self.children.iter().map(|c| c.total_nodes()).sum::<usize>()
    }

    /// Deepest `depth` value anywhere in the subtree.
    pub fn max_depth(&self) -> u32 {
        self.children
            .iter()
            .map(|c| c.max_depth())
            .max()
            .unwrap_or(self.depth)
            .max(self.depth)
    }

    pub fn subtree_tokens(&self) -> u64 {
        self.tokens_used.unwrap_or(0) + self.children.iter().map(|c| c.subtree_tokens()).sum::<u64>()
    }

    pub fn subtree_cost(&self) -> f64 {
        self.cost_usd.unwrap_or(0.0) + self.children.iter().map(|c| c.subtree_cost()).sum::<f64>()
    }
}
