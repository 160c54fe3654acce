use criterion::{criterion_group, criterion_main, Criterion};
use dagflow_core::{run, GraphBuilder, RunOptions};
use serde_json::json;

fn fan_out_fan_in_graph() -> dagflow_core::Graph {
    GraphBuilder::new()
        .node("a", |v| async move { Ok(v) })
        .node("b1", |v| async move { Ok(v) })
        .node("b2", |v| async move { Ok(v) })
        .node("b3", |v| async move { Ok(v) })
        .node("b4", |v| async move { Ok(v) })
        .node("d", |v| async move {
            let total = v
                .as_object()
                .unwrap()
                .values()
                .filter_map(|x| x["a"].as_i64())
                .sum::<i64>();
            Ok(json!(total))
        })
        .edge("a", "b1")
        .edge("a", "b2")
        .edge("a", "b3")
        .edge("a", "b4")
        .edge("b1", "d")
        .edge("b2", "d")
        .edge("b3", "d")
        .edge("b4", "d")
        .start("a")
        .end("d")
        .build()
        .unwrap()
}

fn bench_run_overhead(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let graph = fan_out_fan_in_graph();

    c.bench_function("fan_out_fan_in_run", |b| {
        b.to_async(&runtime).iter(|| async {
            run(&graph, RunOptions::new(), json!(1)).await.unwrap();
        });
    });
}

criterion_group!(benches, bench_run_overhead);
criterion_main!(benches);
