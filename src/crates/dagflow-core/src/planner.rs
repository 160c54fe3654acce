//! Topological planner (§4.1): orders nodes so that every node appears
//! after all of its non-redundant predecessors, and resolves which edge
//! "wins" when duplicates target the same ordered pair.

use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// One planned step: a node plus the (deduplicated) edges feeding it.
#[derive(Debug, Clone)]
pub(crate) struct PlannedNode {
    pub node: NodeId,
    pub inbound: Vec<Edge>,
}

/// Produce a valid topological order, deduplicating edges between the same
/// ordered pair (first one wins — §9 "Duplicate edges").
pub(crate) fn plan(graph: &Graph) -> Result<Vec<PlannedNode>> {
    for edge in &graph.edges {
        if !graph.nodes.contains_key(&edge.from) {
            return Err(GraphError::UnknownNode(edge.from.clone()));
        }
        if !graph.nodes.contains_key(&edge.to) {
            return Err(GraphError::UnknownNode(edge.to.clone()));
        }
    }
    if graph.edges.iter().any(|e| e.to == graph.start) {
        return Err(GraphError::StartHasInboundEdges(graph.start.clone()));
    }

    let mut seen_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut inbound: HashMap<NodeId, Vec<Edge>> = HashMap::new();
    let mut outbound: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut indegree: HashMap<NodeId, usize> = graph.nodes.keys().map(|n| (n.clone(), 0)).collect();

    for edge in &graph.edges {
        let pair = (edge.from.clone(), edge.to.clone());
        if !seen_pairs.insert(pair) {
            continue; // duplicate (from, to): first one already recorded wins
        }
        inbound.entry(edge.to.clone()).or_default().push(edge.clone());
        outbound.entry(edge.from.clone()).or_default().push(edge.to.clone());
        *indegree.get_mut(&edge.to).expect("validated above") += 1;
    }

    check_reachable(graph)?;

    // Kahn's algorithm. Ties broken by sorting the ready set each round, so
    // the order is deterministic within one run even though it is otherwise
    // arbitrary (§4.1).
    let mut ready: Vec<NodeId> = indegree.iter().filter(|(_, &d)| d == 0).map(|(n, _)| n.clone()).collect();
    ready.sort();
    let mut queue: VecDeque<NodeId> = ready.into();
    let mut indegree = indegree;
    let mut planned = Vec::with_capacity(graph.nodes.len());

    while let Some(node) = queue.pop_front() {
        planned.push(PlannedNode { inbound: inbound.remove(&node).unwrap_or_default(), node: node.clone() });

        if let Some(successors) = outbound.get(&node) {
            let mut newly_ready = Vec::new();
            for succ in successors {
                let d = indegree.get_mut(succ).expect("successor exists");
                *d -= 1;
                if *d == 0 {
                    newly_ready.push(succ.clone());
                }
            }
            newly_ready.sort();
            for n in newly_ready {
                queue.push_back(n);
            }
        }
    }

    if planned.len() != graph.nodes.len() {
        let remaining: Vec<NodeId> = indegree.iter().filter(|(_, &d)| d > 0).map(|(n, _)| n.clone()).collect();
        let mut sample: Vec<NodeId> = remaining.clone();
        sample.sort();
        sample.truncate(3);
        return Err(GraphError::Cycle { remaining: remaining.len(), sample });
    }

    Ok(planned)
}

/// Cheap structural check used both by `plan` and by `GraphBuilder::build`:
/// is `end` reachable from `start` at all?
pub(crate) fn check_reachable(graph: &Graph) -> Result<()> {
    let mut outbound: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &graph.edges {
        outbound.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![graph.start.as_str()];
    visited.insert(graph.start.as_str());

    while let Some(node) = stack.pop() {
        if node == graph.end {
            return Ok(());
        }
        if let Some(successors) = outbound.get(node) {
            for &succ in successors {
                if visited.insert(succ) {
                    stack.push(succ);
                }
            }
        }
    }

    if graph.start == graph.end {
        return Ok(());
    }

    Err(GraphError::UnreachableEnd { start: graph.start.clone(), end: graph.end.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use serde_json::json;

    fn identity_builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    #[test]
    fn diamond_orders_start_before_end() {
        let graph = identity_builder()
            .node("a", |v| async move { Ok(v) })
            .node("b", |v| async move { Ok(v) })
            .node("c", |v| async move { Ok(v) })
            .node("d", |v| async move { Ok(v) })
            .edge("a", "b")
            .edge("a", "c")
            .edge("b", "d")
            .edge("c", "d")
            .start("a")
            .end("d")
            .build()
            .unwrap();

        let planned = plan(&graph).unwrap();
        let order: Vec<&str> = planned.iter().map(|p| p.node.as_str()).collect();
        assert_eq!(order.first(), Some(&"a"));
        assert_eq!(order.last(), Some(&"d"));
        assert!(order.iter().position(|&n| n == "b").unwrap() < order.iter().position(|&n| n == "d").unwrap());
        assert!(order.iter().position(|&n| n == "c").unwrap() < order.iter().position(|&n| n == "d").unwrap());
    }

    #[test]
    fn cycle_is_rejected() {
        // Bypass GraphBuilder::build (which also rejects cycles via reachability
        // happening to hold) by constructing the Graph directly through the
        // planner's own validation path.
        let graph = identity_builder()
            .node("a", |v| async move { Ok(v) })
            .node("b", |v| async move { Ok(v) })
            .edge("a", "b")
            .start("a")
            .end("b")
            .build()
            .unwrap();
        // Graph is immutable once built; simulate a cycle by re-deriving one
        // with a manufactured back edge via the crate-internal constructor.
        let mut cyclic = graph.clone();
        cyclic.edges.push(Edge::new("b", "a"));
        let err = plan(&cyclic).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }

    #[test]
    fn unreachable_end_is_rejected() {
        let err = identity_builder()
            .node("a", |v| async move { Ok(v) })
            .node("b", |v| async move { Ok(v) })
            .start("a")
            .end("b")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnreachableEnd { .. }));
    }

    #[test]
    fn start_with_inbound_edges_is_rejected() {
        let err = identity_builder()
            .node("a", |v| async move { Ok(v) })
            .node("b", |v| async move { Ok(v) })
            .edge("b", "a")
            .start("a")
            .end("a")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::StartHasInboundEdges(_)));
    }

    #[test]
    fn duplicate_edges_first_wins() {
        let graph = identity_builder()
            .node("a", |v| async move { Ok(v) })
            .node("b", |_v| async move { Ok(json!(null)) })
            .edge_with("a", "b", crate::graph::EdgeOptions::new().name("first"))
            .edge_with("a", "b", crate::graph::EdgeOptions::new().name("second"))
            .start("a")
            .end("b")
            .build()
            .unwrap();

        let planned = plan(&graph).unwrap();
        let b = planned.iter().find(|p| p.node == "b").unwrap();
        assert_eq!(b.inbound.len(), 1);
        assert_eq!(b.inbound[0].options.as_ref().unwrap().name.as_deref(), Some("first"));
    }
}
