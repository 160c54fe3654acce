//! Core graph data model: nodes, edges and edge-shaping options.
//!
//! A [`Graph`] is an immutable value once built — nothing in [`crate::run`]
//! or [`crate::run_sync`] mutates it. Node functions are unary: they take a
//! JSON [`Value`] payload and return a JSON `Value`, asynchronously,
//! fallibly. For a source node the payload is whatever the caller passed
//! in; for a dependent node it is the assembled input mapping built by its
//! inbound [`EdgeOptions`] (always a JSON object).
//!
//! # Example
//!
//! ```
//! use dagflow_core::graph::GraphBuilder;
//! use serde_json::json;
//!
//! let graph = GraphBuilder::new()
//!     .node("a", |v| async move { Ok(v) })
//!     .node("b", |v| async move { Ok(json!(v["a"].as_i64().unwrap_or(0) + 1)) })
//!     .edge("a", "b")
//!     .start("a")
//!     .end("b")
//!     .build()
//!     .unwrap();
//! assert_eq!(graph.start(), "a");
//! ```

use crate::error::{GraphError, NodeFailure, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Opaque, comparable node identifier.
pub type NodeId = String;

/// A future boxed for storage behind a trait object, the shape every node
/// function and edge hook ultimately normalizes to.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A node's user function: payload in, value out, fallibly, asynchronously.
pub type NodeFn = Arc<dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, NodeFailure>> + Send + Sync>;

/// Unary value transform applied to an edge's upstream value.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Inclusion predicate applied to an edge's (post-transform) value.
pub type FilterFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Per-edge shaping: rename, transform, filter (§4.2 edge operator).
///
/// `transform` runs before `filter` — that order is observable and part of
/// the contract, not an implementation detail.
#[derive(Clone, Default)]
pub struct EdgeOptions {
    pub name: Option<String>,
    pub transform: Option<TransformFn>,
    pub filter: Option<FilterFn>,
}

impl fmt::Debug for EdgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeOptions")
            .field("name", &self.name)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl EdgeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
        self
    }
}

/// One dependency arrow, optionally carrying shaping options.
#[derive(Clone, Debug)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub options: Option<EdgeOptions>,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self { from: from.into(), to: to.into(), options: None }
    }

    pub fn with_options(from: impl Into<NodeId>, to: impl Into<NodeId>, options: EdgeOptions) -> Self {
        Self { from: from.into(), to: to.into(), options: Some(options) }
    }
}

/// The caller-supplied DAG: nodes, edges, and the designated start/end.
///
/// Immutable for the lifetime of a run. Construct one directly or, more
/// conveniently, through [`GraphBuilder`].
#[derive(Clone)]
pub struct Graph {
    pub(crate) nodes: HashMap<NodeId, NodeFn>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

impl Graph {
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Fluent construction of a [`Graph`], performing the structural checks
/// §4.1/§7/§9 call for at `build()` time rather than deferring them into
/// the planner (though the planner re-checks defensively — see
/// [`crate::planner`]).
#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<NodeId, NodeFn>,
    edges: Vec<Edge>,
    start: Option<NodeId>,
    end: Option<NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under `id`. Accepts a plain async closure returning
    /// `Result<Value, NodeFailure>` — no manual boxing required.
    pub fn node<F, Fut>(mut self, id: impl Into<NodeId>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, NodeFailure>> + Send + 'static,
    {
        let f: NodeFn = Arc::new(move |v| Box::pin(f(v)));
        self.nodes.insert(id.into(), f);
        self
    }

    pub fn edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    pub fn edge_with(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>, options: EdgeOptions) -> Self {
        self.edges.push(Edge::with_options(from, to, options));
        self
    }

    pub fn start(mut self, id: impl Into<NodeId>) -> Self {
        self.start = Some(id.into());
        self
    }

    pub fn end(mut self, id: impl Into<NodeId>) -> Self {
        self.end = Some(id.into());
        self
    }

    pub fn build(self) -> Result<Graph> {
        let start = self.start.ok_or_else(|| GraphError::MissingNode("<no start set>".to_string()))?;
        let end = self.end.ok_or_else(|| GraphError::MissingNode("<no end set>".to_string()))?;

        if !self.nodes.contains_key(&start) {
            return Err(GraphError::MissingNode(start));
        }
        if !self.nodes.contains_key(&end) {
            return Err(GraphError::MissingNode(end));
        }
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.from) {
                return Err(GraphError::UnknownNode(edge.from.clone()));
            }
            if !self.nodes.contains_key(&edge.to) {
                return Err(GraphError::UnknownNode(edge.to.clone()));
            }
        }
        if self.edges.iter().any(|e| e.to == start) {
            return Err(GraphError::StartHasInboundEdges(start));
        }

        let graph = Graph { nodes: self.nodes, edges: self.edges, start, end };
        crate::planner::check_reachable(&graph)?;
        Ok(graph)
    }
}
