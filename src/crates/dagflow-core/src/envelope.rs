//! The message shape carried on every channel in a run (§3 "Data flow").

use crate::context::RunContext;
use crate::graph::NodeId;
use serde_json::Value;

/// `(producer-node, run-context, value)` — what every node emits on its
/// outbound channel and every consumer receives on each inbound edge.
#[derive(Debug, Clone)]
pub(crate) struct Envelope {
    pub from: NodeId,
    pub ctx: RunContext,
    pub value: Value,
}
