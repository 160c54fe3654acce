//! # dagflow-core — a concurrent DAG-of-functions scheduler
//!
//! `dagflow-core` executes a caller-supplied directed acyclic graph of
//! functions with maximum permitted parallelism, dependency-respecting data
//! flow, per-edge input shaping, and failure-driven abortion of downstream
//! work.
//!
//! ## Core Concepts
//!
//! - **[`Graph`]** — nodes (unary async functions), edges (dependency
//!   arrows with optional rename/transform/filter), a start node and an end
//!   node. Build one with [`GraphBuilder`].
//! - **Run** — [`run`] (async) or [`run_sync`] (blocking) execute the graph
//!   once against a payload and return the end node's result together with
//!   a [`RunContext`] describing the run's timing and outcome.
//! - **Abort propagation** — when a node's function fails, the failure
//!   rides along in-band as `control = abort` on every downstream message;
//!   nodes that observe it skip their own invocation without running.
//!   Nodes outside that failure's reach run normally.
//! - **Observer** — an optional sink receiving a [`NodeRecord`] per node,
//!   dispatched off the dataflow's critical path.
//!
//! ## Quick Start
//!
//! ```
//! use dagflow_core::{run_sync, GraphBuilder, RunOptions};
//! use serde_json::json;
//!
//! let graph = GraphBuilder::new()
//!     .node("a", |v| async move { Ok(v) })
//!     .node("b", |v| async move { Ok(json!(v["a"].as_i64().unwrap() + 1)) })
//!     .node("c", |v| async move { Ok(json!(v["a"].as_i64().unwrap() - 1)) })
//!     .node("d", |v| async move {
//!         Ok(json!(v["b"].as_i64().unwrap() * v["c"].as_i64().unwrap()))
//!     })
//!     .edge("a", "b")
//!     .edge("a", "c")
//!     .edge("b", "d")
//!     .edge("c", "d")
//!     .start("a")
//!     .end("d")
//!     .build()
//!     .unwrap();
//!
//! let result = run_sync(&graph, RunOptions::new(), json!(3)).unwrap();
//! assert_eq!(result, json!(8));
//! ```
//!
//! ## Module Organization
//!
//! - [`graph`] — [`Graph`], [`GraphBuilder`], edge shaping types.
//! - [`context`] — [`RunContext`], the run-id/control/timing metadata
//!   threaded through every message.
//! - [`record`] — [`NodeRecord`], the per-node outcome delivered to an
//!   observer.
//! - [`error`] — [`GraphError`], [`NodeFailure`].
//! - [`assembler`] — [`RunOptions`] and the channel wiring behind [`run`].
//! - [`visualization`] — render a [`Graph`] as Graphviz DOT.
//!
//! The planner, edge operator and node runtime are internal: they are the
//! engine [`run`]/[`run_sync`] drive, not part of the public surface.

mod assembler;
mod context;
mod edge_ops;
mod envelope;
pub mod error;
pub mod graph;
mod node_runtime;
mod observer;
mod planner;
pub mod record;
pub mod visualization;

pub use assembler::RunOptions;
pub use context::{Control, RunContext};
pub use error::{GraphError, NodeFailure, Result};
pub use graph::{EdgeOptions, Graph, GraphBuilder, NodeId};
pub use observer::Observer;
pub use record::{NodeRecord, NodeStatus};
pub use visualization::visualize;

use serde_json::Value;
use std::sync::OnceLock;

/// Execute `graph` once against `payload`. Returns the end node's result
/// together with the [`RunContext`] describing the run — including, on
/// abort, the failure under `ctx.ex` (§4.6). This is the async entry
/// point: its future *is* the "handle" the spec describes, and any node
/// reachable from the start but not an ancestor of the end node keeps
/// running, detached, on whatever runtime is driving this future, even
/// after it resolves.
pub async fn run(graph: &Graph, options: RunOptions, payload: Value) -> Result<(RunContext, Value)> {
    assembler::run(graph, options, payload).await
}

fn sync_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("dagflow-sync")
            .build()
            .expect("failed to start background runtime for run_sync")
    })
}

/// Blocking variant of [`run`]. Raises [`GraphError::Aborted`] if the
/// returned context has `control == abort`; otherwise returns the bare
/// result, dropping the context (§4.6).
///
/// Backed by a lazily-started, process-lifetime background runtime shared
/// across calls, so that dangling branches still in flight when this
/// returns keep running to completion rather than being cancelled the
/// instant an ephemeral runtime would be dropped. Call this from a
/// non-async context; calling it from inside an existing Tokio runtime
/// panics, same as any other blocking bridge into a nested runtime.
pub fn run_sync(graph: &Graph, options: RunOptions, payload: Value) -> Result<Value> {
    let (ctx, value) = sync_runtime().block_on(run(graph, options, payload))?;
    if ctx.is_aborted() {
        let failure = ctx.ex.clone().unwrap_or_else(|| NodeFailure::new("execution aborted due to exception"));
        return Err(GraphError::Aborted(failure));
    }
    Ok(value)
}
