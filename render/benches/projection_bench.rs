use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kgview_core::model::{Edge, Node};
use render::project;
use serde_json::json;
use storage::GraphStore;

fn seeded_store(node_count: usize) -> GraphStore {
    let nodes = (0..node_count)
        .map(|i| Node::new(format!("n{i}"), format!("Entity {i}"), "Entity").with_prop("rank", json!(i)))
        .collect();
    let edges = (1..node_count)
        .map(|i| Edge::new(format!("e{i}"), format!("n{}", i / 2), format!("n{i}"), "related_to"))
        .collect();

    let mut store = GraphStore::new();
    // Generated ids are unique and every edge points at an earlier node.
    store.replace_snapshot(nodes, edges).unwrap();
    store
}

fn projection_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    for node_count in [100, 1_000, 10_000] {
        let store = seeded_store(node_count);
        group.bench_with_input(BenchmarkId::from_parameter(node_count), &store, |b, store| {
            b.iter(|| project(black_box(store.current())))
        });
        group.bench_with_input(
            BenchmarkId::new("to_json_string", node_count),
            &store,
            |b, store| b.iter(|| project(black_box(store.current())).to_json_string()),
        );
    }
    group.finish();
}

criterion_group!(benches, projection_benchmark);
criterion_main!(benches);
