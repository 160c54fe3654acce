//! Property tests over randomly generated layered DAGs: dependency respect,
//! exactly-once invocation, abort propagation, and run-id shape should hold
//! no matter how the graph is shaped, as long as it's well-formed.

use dagflow_core::{run_sync, GraphBuilder, NodeFailure, RunOptions};
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds a layered DAG: `width` nodes per layer, `layers` layers, every
/// node in layer i wired to every node in layer i+1. A single `start` feeds
/// layer 0 and a single `end` collects the last layer, so the whole graph
/// stays connected and well-formed regardless of width/layers.
fn layered_graph(
    layers: usize,
    width: usize,
    invocations: Arc<AtomicUsize>,
    fail_node: Option<String>,
) -> dagflow_core::Graph {
    let mut builder = GraphBuilder::new().node("start", |v| async move { Ok(v) });

    let mut layer_ids: Vec<Vec<String>> = Vec::new();
    for l in 0..layers {
        let mut ids = Vec::new();
        for w in 0..width {
            let id = format!("n{l}_{w}");
            ids.push(id.clone());
            let counter = invocations.clone();
            let should_fail = fail_node.as_deref() == Some(id.as_str());
            builder = builder.node(id, move |v| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if should_fail {
                        Err(NodeFailure::new("layered-failure"))
                    } else {
                        Ok(v)
                    }
                }
            });
        }
        layer_ids.push(ids);
    }

    builder = builder.node("end", |v| async move { Ok(v) });

    for id in &layer_ids[0] {
        builder = builder.edge("start", id);
    }
    for pair in layer_ids.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        for p in prev {
            for n in next {
                builder = builder.edge(p, n);
            }
        }
    }
    for id in layer_ids.last().unwrap() {
        builder = builder.edge(id, "end");
    }

    builder.start("start").end("end").build().unwrap()
}

proptest! {
    #[test]
    fn exactly_once_without_failure(layers in 1usize..4, width in 1usize..4) {
        let invocations = Arc::new(AtomicUsize::new(0));
        let graph = layered_graph(layers, width, invocations.clone(), None);
        let result = run_sync(&graph, RunOptions::new(), json!({"seed": 1}));
        prop_assert!(result.is_ok());
        prop_assert_eq!(invocations.load(Ordering::SeqCst), layers * width);
    }

    #[test]
    fn failure_in_first_layer_skips_every_downstream_node(layers in 2usize..4, width in 1usize..3) {
        let invocations = Arc::new(AtomicUsize::new(0));
        let fail_node = "n0_0".to_string();
        let graph = layered_graph(layers, width, invocations.clone(), Some(fail_node));
        let result = run_sync(&graph, RunOptions::new(), json!({"seed": 1}));
        prop_assert!(result.is_err());
        // only layer 0 runs; every later layer and "end" is skipped.
        prop_assert_eq!(invocations.load(Ordering::SeqCst), width);
    }
}

#[tokio::test]
async fn run_id_is_21_chars_from_the_documented_alphabet() {
    let graph = GraphBuilder::new()
        .node("a", |v| async move { Ok(v) })
        .start("a")
        .end("a")
        .build()
        .unwrap();

    for _ in 0..20 {
        let (ctx, _) = dagflow_core::run(&graph, RunOptions::new(), json!(1)).await.unwrap();
        assert_eq!(ctx.run_id.len(), 21);
        assert!(ctx.run_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
