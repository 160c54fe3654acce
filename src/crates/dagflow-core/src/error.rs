//! Error types for graph construction, planning and execution.
//!
//! Mirrors the shape the rest of the corpus uses: one `thiserror` enum for
//! everything the engine itself can fail with, plus a distinct value type
//! for the failure a *node* raises. The latter is never an `Err` that
//! crosses the dataflow — it rides along in [`RunContext`](crate::context::RunContext)
//! as in-band data and only becomes a Rust error at the synchronous entry
//! point.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Everything the engine itself can fail with: bad graph shape, or an
/// aborted run surfaced by the synchronous entry point.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// The planner could not produce a topological order — the graph has a cycle.
    #[error("graph contains a cycle; could not order {remaining} node(s) ({sample:?}, ...)")]
    Cycle { remaining: usize, sample: Vec<NodeId> },

    /// `end-node` is not reachable from `start-node`.
    #[error("end node '{end}' is not reachable from start node '{start}'")]
    UnreachableEnd { start: NodeId, end: NodeId },

    /// `start-node` has one or more inbound edges.
    #[error("start node '{0}' has inbound edges")]
    StartHasInboundEdges(NodeId),

    /// An edge references a node id that was never added to the graph.
    #[error("edge references unknown node '{0}'")]
    UnknownNode(NodeId),

    /// `start-node` or `end-node` was not added to the graph.
    #[error("node '{0}' is not defined in the graph")]
    MissingNode(NodeId),

    /// A channel closed before the node wiring it was serving produced its
    /// one expected message. This indicates a bug in the assembler, not a
    /// caller error — well-formed runs always deliver exactly one message
    /// per channel.
    #[error("internal wiring error: {0} closed without a message")]
    ChannelClosed(String),

    /// `run_sync` observed `control == abort` in the returned context.
    #[error("Execution aborted due to exception")]
    Aborted(NodeFailure),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// The failure value a node function raises.
///
/// Analogous to an `ex-info` in the original: a human-readable message plus
/// an arbitrary JSON payload describing what went wrong. This is the value
/// stored under [`RunContext::ex`](crate::context::RunContext::ex) and the
/// one `run_sync` surfaces under its `Aborted` variant's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFailure {
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl NodeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), data: Value::Null }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Self { message: message.into(), data }
    }
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NodeFailure {}
