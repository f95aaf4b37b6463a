use std::collections::HashMap;

use crate::ingest::{DelegationEvent, TimeKey};

use super::matching::MatchStrategy;
use super::DelegationNode;

/// Reconstruct the delegation forest from a flat event slice.
///
/// End events are paired with [`MatchStrategy::Recency`]. A node at depth `d > 0`
/// hangs under the depth `d - 1` node whose start most closely precedes its own;
/// nodes without such a parent are promoted to roots. Roots come back in file order.
pub fn build_tree(events: &[DelegationEvent]) -> Vec<DelegationNode> {
    let mut nodes: Vec<Option<DelegationNode>> = Vec::new();
    for pairing in MatchStrategy::Recency.pair(events) {
        let DelegationEvent::Start(start) = &events[pairing.start] else {
            continue;
        };
        let mut node = DelegationNode::from_start(start);
        if let Some(DelegationEvent::End(end)) = pairing.end.map(|i| &events[i]) {
            node.complete(end);
        }
        nodes.push(Some(node));
    }

    let parents = assign_parents(&nodes);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(idx),
            None => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .filter_map(|idx| assemble(idx, &mut nodes, &children))
        .collect()
}

/// For each node, the index of its parent (or `None` for roots).
fn assign_parents(nodes: &[Option<DelegationNode>]) -> Vec<Option<usize>> {
    let flat: Vec<&DelegationNode> = nodes.iter().flatten().collect();
    let keys: Vec<TimeKey<'_>> = flat.iter().map(|n| TimeKey::new(&n.start_time)).collect();

    // Nodes per depth, sorted by (start time, index).
    let mut by_depth: HashMap<u32, Vec<(TimeKey<'_>, usize)>> = HashMap::new();
    for (idx, node) in flat.iter().enumerate() {
        by_depth.entry(node.depth).or_default().push((keys[idx], idx));
    }
    for level in by_depth.values_mut() {
        level.sort_unstable();
    }

    flat.iter()
        .enumerate()
        .map(|(idx, child)| {
            let level = by_depth.get(&child.depth.checked_sub(1)?)?;
            // Last strictly earlier start; on equal start times the later line wins.
            let earlier = level.partition_point(|(key, _)| *key < keys[idx]);
            earlier.checked_sub(1).map(|i| level[i].1)
        })
        .collect()
}

fn assemble(
    idx: usize,
    nodes: &mut [Option<DelegationNode>],
    children: &[Vec<usize>],
) -> Option<DelegationNode> {
    let mut node = nodes[idx].take()?;
    for &child in &children[idx] {
        if let Some(c) = assemble(child, nodes, children) {
            node.children.push(c);
        }
    }
    Some(node)
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
