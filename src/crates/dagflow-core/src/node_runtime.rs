//! Node runtime (§4.3): executes one node's user function exactly once per
//! run, classifies the outcome, and emits the outgoing envelope.

use crate::context::{now_ms, RunContext};
use crate::edge_ops;
use crate::envelope::Envelope;
use crate::graph::{Edge, NodeFn, NodeId};
use crate::observer::{self, Observer};
use crate::record::{NodeRecord, NodeStatus};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, oneshot};

/// This node's inbound wiring, already tapped by the assembler before any
/// task was spawned (see `assembler::run` for why ordering matters here).
pub(crate) enum Inbound {
    /// The start node: one seed message, no shaping.
    Source(oneshot::Receiver<Envelope>),
    /// Any other node: one tap per inbound edge, merged.
    Dependent(Vec<(Edge, broadcast::Receiver<Envelope>)>),
}

/// This node's outbound wiring: every node, including the end node, fans
/// out over broadcast. The assembler taps the end node's fanout exactly
/// like any other consumer would, which sidesteps having to special-case a
/// (rare, but not forbidden) edge whose `from` is the end node.
pub(crate) struct Outbound(pub(crate) broadcast::Sender<Envelope>);

/// Run one node to completion and publish its result. Spawned as an
/// independent task per node per run by the assembler.
pub(crate) async fn run_node(
    node: NodeId,
    f: NodeFn,
    inbound: Inbound,
    outbound: Outbound,
    observer: Option<Observer>,
) {
    let start_request = now_ms();

    let (mut ctx, input_for_fn, input_for_record, must_skip, node_start) = match inbound {
        Inbound::Source(rx) => {
            let envelope = match rx.await {
                Ok(e) => e,
                Err(_) => return, // seed was never sent; nothing to run
            };
            let mut ctx = envelope.ctx;
            let node_start = now_ms();
            ctx.start_execution = Some(node_start);
            (ctx, envelope.value.clone(), envelope.value, false, node_start)
        }
        Inbound::Dependent(taps) => {
            let mut pending = FuturesUnordered::new();
            for (edge, mut rx) in taps {
                pending.push(async move {
                    let result = rx.recv().await;
                    (edge, result)
                });
            }

            let mut ctx: Option<RunContext> = None;
            let mut must_skip = false;
            let mut input_map = Map::new();

            while let Some((edge, result)) = pending.next().await {
                let envelope = match result {
                    Ok(e) => e,
                    // A producer can only ever send once and every inbound
                    // edge gets its own tap, so a closed/lagged channel here
                    // means that edge's contribution is simply unavailable;
                    // draining must still continue for the rest (§9).
                    Err(_) => continue,
                };

                if envelope.ctx.is_aborted() {
                    must_skip = true;
                    ctx = Some(envelope.ctx.clone());
                } else if !must_skip {
                    ctx = Some(envelope.ctx.clone());
                }

                if let Some((key, value)) = edge_ops::apply(&edge, &envelope.from, envelope.value) {
                    input_map.insert(key, value);
                }
            }

            let mut ctx = ctx.expect("a dependent node has at least one inbound edge");
            // The run-wide start_execution belongs to the start node alone
            // and must propagate read-only from here on; only a node whose
            // merged context somehow never saw it (unreachable in a
            // well-formed graph, but cheap to guard) would set it.
            let node_start = now_ms();
            if ctx.start_execution.is_none() {
                ctx.start_execution = Some(node_start);
            }
            let input_value = Value::Object(input_map);
            (ctx, input_value.clone(), input_value, must_skip, node_start)
        }
    };

    let (status, output) = if must_skip {
        tracing::debug!(node = %node, "skipping: upstream abort observed");
        (NodeStatus::Skipped, Value::Null)
    } else {
        match f(input_for_fn).await {
            Ok(value) => {
                tracing::debug!(node = %node, "completed");
                (NodeStatus::Done, value)
            }
            Err(failure) => {
                tracing::warn!(node = %node, error = %failure, "node failed; aborting downstream");
                ctx.mark_abort(failure.clone());
                let output = serde_json::to_value(&failure).unwrap_or(Value::Null);
                (NodeStatus::Failed, output)
            }
        }
    };

    let end_execution = now_ms();
    ctx.end_execution = Some(end_execution);

    if observer.is_some() {
        let record = NodeRecord {
            run_id: ctx.run_id.clone(),
            node: node.clone(),
            start_request,
            waiting_ms: node_start - start_request,
            start_execution: node_start,
            end_execution,
            elapsed_execution_ms: end_execution - node_start,
            elapsed_total_ms: end_execution - start_request,
            input: if matches!(status, NodeStatus::Skipped) { Value::Null } else { input_for_record },
            status,
            output: output.clone(),
        };
        observer::dispatch(&observer, record);
    }

    let out_envelope = Envelope { from: node, ctx, value: output };
    // Err here just means every subscriber already dropped its receiver (a
    // fully dangling node with no live consumers) — not a failure of this
    // node's run.
    let _ = outbound.0.send(out_envelope);
}
