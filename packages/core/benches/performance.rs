//! Performance benchmarks for Stagehand core operations
//!
//! Run with: `cargo bench -p stagehand-core`
//!
//! These benchmarks measure critical path performance:
//! - `invoke_and_push` of a property edit (perform, projection, history)
//! - Undo/redo of a structural edit in a populated scene
//! - Drop validation against a deep hierarchy snapshot

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use stagehand_core::graph::can_drop_node;
use stagehand_core::operations::{CreateNodeOperation, NodeSpec, SetPropertyOperation};
use stagehand_core::{EditorSession, NodeId, OperationService};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// A session whose active document holds a chain of `depth` nested groups,
/// each with a mesh beside the next level
async fn setup_scene(depth: usize) -> (EditorSession, Arc<OperationService>, Vec<NodeId>) {
    let session = EditorSession::default();
    session.new_document("Bench");
    let service = session.active_document().unwrap();

    let mut chain = Vec::with_capacity(depth);
    for level in 0..depth {
        let mut group = CreateNodeOperation::new(NodeSpec::new("group").named(format!("Level {}", level)));
        group.parent = chain.last().cloned();
        service.invoke_and_push(&group).await.unwrap();
        let group_id = session.state().selection.primary_node_id.clone().unwrap();

        service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")).under(group_id.clone()))
            .await
            .unwrap();
        chain.push(group_id);
    }
    (session, service, chain)
}

fn bench_invoke_and_push(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_session, service, chain) = rt.block_on(setup_scene(20));
    let target = chain[10].clone();

    let mut x = 0.0_f64;
    c.bench_function("invoke_and_push_set_position", |b| {
        b.iter(|| {
            x += 1.0;
            let edit = SetPropertyOperation::new(target.clone(), "position", json!([x, 0.0, 0.0]));
            rt.block_on(async { black_box(service.invoke_and_push(&edit).await.unwrap()) })
        })
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_session, service, _chain) = rt.block_on(setup_scene(50));

    c.bench_function("undo_redo_create_in_populated_scene", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(service.undo().await.unwrap());
                black_box(service.redo().await.unwrap());
            })
        })
    });
}

fn bench_drop_validation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (session, _service, chain) = rt.block_on(setup_scene(200));
    let state = session.state();
    let hierarchy = state.scenes.active_hierarchy().unwrap();
    let (top, bottom) = (chain[0].clone(), chain[chain.len() - 1].clone());

    c.bench_function("can_drop_node_deep_cycle_check", |b| {
        b.iter(|| black_box(can_drop_node(hierarchy, black_box(&top), Some(black_box(&bottom)))))
    });
}

criterion_group!(
    benches,
    bench_invoke_and_push,
    bench_undo_redo,
    bench_drop_validation
);
criterion_main!(benches);
