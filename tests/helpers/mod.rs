use crate::ingest::{DelegationEnd, DelegationEvent, DelegationStart};

/// Create a Start event in run `r1`.
pub fn start(agent: &str, depth: u32, ts: &str) -> DelegationEvent {
    start_in("r1", agent, depth, ts)
}

/// Create a Start event in the given run.
pub fn start_in(run_id: &str, agent: &str, depth: u32, ts: &str) -> DelegationEvent {
    DelegationEvent::Start(DelegationStart {
        run_id: Some(run_id.to_string()),
        agent_name: agent.to_string(),
        provider: "anthropic".to_string(),
        model: "claude-sonnet-4".to_string(),
        depth,
        agentic: true,
        timestamp: ts.to_string(),
    })
}

/// Create a successful End event in run `r1` with no token or cost data.
pub fn end(agent: &str, depth: u32, ts: &str, duration_ms: u64) -> DelegationEvent {
    end_in("r1", agent, depth, ts, duration_ms, true, None, None)
}

/// Create an End event with every field spelled out.
#[allow(clippy::too_many_arguments)]
pub fn end_in(
    run_id: &str,
    agent: &str,
    depth: u32,
    ts: &str,
    duration_ms: u64,
    success: bool,
    tokens_used: Option<u64>,
    cost_usd: Option<f64>,
) -> DelegationEvent {
    DelegationEvent::End(DelegationEnd {
        run_id: Some(run_id.to_string()),
        agent_name: agent.to_string(),
        provider: "anthropic".to_string(),
        model: "claude-sonnet-4".to_string(),
        depth,
        agentic: true,
        duration_ms,
        success,
        error_message: if success { None } else { Some("failed".to_string()) },
        tokens_used,
        cost_usd,
        timestamp: ts.to_string(),
    })
}

/// Override the model and provider on any event.
pub fn with_model(mut event: DelegationEvent, provider: &str, model: &str) -> DelegationEvent {
    match event {
        DelegationEvent::Start(ref mut s) => {
            s.provider = provider.to_string();
            s.model = model.to_string();
        }
        DelegationEvent::End(ref mut e) => {
            e.provider = provider.to_string();
            e.model = model.to_string();
        }
    }
    event
}

/// Serialize an event to a JSONL line.
pub fn jsonl(event: &DelegationEvent) -> String {
    serde_json::to_string(event).unwrap()
}
