//! Run assembler (§4.4): wires channels between planned nodes, launches
//! every node concurrently, feeds the start node, and awaits the end node.

use crate::context::{generate_run_id, now_ms, RunContext};
use crate::envelope::Envelope;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};
use crate::node_runtime::{run_node, Inbound, Outbound};
use crate::observer::Observer;
use crate::planner;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, oneshot};

/// Options recognized by [`crate::run`]/[`crate::run_sync`] (§6). Unknown
/// fields can't exist in a typed struct, which is this crate's reading of
/// "unknown options are ignored".
#[derive(Clone, Default)]
pub struct RunOptions {
    pub observer: Option<Observer>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Execute `graph` once against `payload`, returning the end node's result
/// together with the context describing the run.
pub async fn run(graph: &Graph, options: RunOptions, payload: Value) -> Result<(RunContext, Value)> {
    let planned = planner::plan(graph)?;

    let run_id = generate_run_id();
    let start_request = now_ms();
    let seed_ctx = RunContext::new(run_id, start_request);

    // Pass 1: allocate every node's broadcast outbound channel up front,
    // including the end node's — the assembler is simply one more
    // subscriber to it, same as any consumer node would be.
    let mut fanout: HashMap<NodeId, broadcast::Sender<Envelope>> = HashMap::new();
    for p in &planned {
        let (tx, _rx) = broadcast::channel(1);
        fanout.insert(p.node.clone(), tx);
    }

    let end_rx = fanout.get(&graph.end).expect("end node is always planned").subscribe();

    // Pass 2: tap every consumer's inbound edges against the producers'
    // channels from pass 1, entirely before any task is spawned. A
    // broadcast subscriber that shows up after its producer already sent
    // would simply miss the message — so every tap must exist before
    // anything can possibly send (§9).
    let mut seed_tx = None;
    let mut wired: Vec<(NodeId, Inbound, Outbound)> = Vec::with_capacity(planned.len());

    for p in &planned {
        let outbound = Outbound(fanout.get(&p.node).expect("allocated in pass 1").clone());

        let inbound = if p.inbound.is_empty() {
            let (tx, rx) = oneshot::channel();
            seed_tx = Some(tx);
            Inbound::Source(rx)
        } else {
            let taps = p
                .inbound
                .iter()
                .map(|edge| {
                    let rx = fanout
                        .get(&edge.from)
                        .unwrap_or_else(|| panic!("producer '{}' has no outbound channel", edge.from))
                        .subscribe();
                    (edge.clone(), rx)
                })
                .collect();
            Inbound::Dependent(taps)
        };

        wired.push((p.node.clone(), inbound, outbound));
    }

    // Pass 3: now it's safe to launch every node concurrently.
    for (node, inbound, outbound) in wired {
        let node_fn = graph
            .nodes
            .get(&node)
            .cloned()
            .unwrap_or_else(|| panic!("planned node '{node}' missing its function"));
        let observer = options.observer.clone();
        tokio::spawn(run_node(node, node_fn, inbound, outbound, observer));
    }

    let seed_tx = seed_tx.expect("start node always has no inbound edges and thus a seed channel");
    let _ = seed_tx.send(Envelope { from: graph.start.clone(), ctx: seed_ctx, value: payload });

    let mut end_rx = end_rx;
    let final_envelope =
        end_rx.recv().await.map_err(|_| GraphError::ChannelClosed(format!("end node '{}'", graph.end)))?;

    Ok((final_envelope.ctx, final_envelope.value))
}
