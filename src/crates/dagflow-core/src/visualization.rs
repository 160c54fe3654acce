//! Graph visualization: renders a [`Graph`] as Graphviz DOT for debugging
//! fan-out shape and dangling branches. Pure read-only introspection over
//! the graph's data model — it never touches a run.

use crate::graph::Graph;
use std::fmt::Write as _;

/// Render `graph` as a Graphviz DOT digraph. The start and end nodes are
/// styled distinctly so dangling branches are easy to spot by eye.
pub fn visualize(graph: &Graph) -> String {
    let mut out = String::new();
    writeln!(out, "digraph dagflow {{").unwrap();
    writeln!(out, "  rankdir=LR;").unwrap();

    for id in graph.node_ids() {
        let shape = if id == graph.start() || id == graph.end() { "doublecircle" } else { "circle" };
        writeln!(out, "  \"{id}\" [shape={shape}];").unwrap();
    }

    for edge in graph.edges() {
        let label = match &edge.options {
            Some(opts) if opts.name.is_some() => format!(" [label=\"{}\"]", opts.name.as_ref().unwrap()),
            _ => String::new(),
        };
        writeln!(out, "  \"{}\" -> \"{}\"{};", edge.from, edge.to, label).unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeOptions, GraphBuilder};

    #[test]
    fn renders_nodes_and_edges() {
        let graph = GraphBuilder::new()
            .node("a", |v| async move { Ok(v) })
            .node("b", |v| async move { Ok(v) })
            .edge_with("a", "b", EdgeOptions::new().name("n1"))
            .start("a")
            .end("b")
            .build()
            .unwrap();

        let dot = visualize(&graph);
        assert!(dot.contains("\"a\" -> \"b\" [label=\"n1\"];"));
        assert!(dot.starts_with("digraph dagflow {"));
    }
}
