//! Per-node execution record delivered to an optional observer.

use crate::graph::NodeId;
use serde_json::Value;

/// How a node's invocation was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// The user function ran and returned successfully.
    Done,
    /// The user function ran and raised a failure.
    Failed,
    /// The node observed an upstream abort and never invoked its function.
    Skipped,
}

/// One node's full timing and outcome, handed to the observer (§3, §4.5).
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub run_id: String,
    pub node: NodeId,
    pub start_request: i64,
    pub waiting_ms: i64,
    pub start_execution: i64,
    pub end_execution: i64,
    pub elapsed_execution_ms: i64,
    pub elapsed_total_ms: i64,
    pub input: Value,
    pub status: NodeStatus,
    /// The node's return value (named `output` rather than `return`, a
    /// reserved word in most of this crate's neighboring ecosystems).
    pub output: Value,
}
