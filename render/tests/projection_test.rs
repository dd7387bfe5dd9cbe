use kgview_core::model::{Edge, GraphPayload, Node, SearchMetadata};
use render::project;
use serde_json::json;
use storage::GraphStore;

fn payload() -> GraphPayload {
    GraphPayload::new(
        vec![
            Node::new("n1", "Attention Is All You Need", "Paper")
                .with_prop("year", json!(2017))
                .with_prop("authors", json!(["Vaswani", "Shazeer"])),
            Node::new("n2", "Transformer", "Entity").with_prop("start", json!(0)),
            Node::new("n3", "Self-Attention", "Entity"),
        ],
        vec![
            Edge::new("e1", "n1", "n2", "mentions"),
            Edge::new("e2", "n2", "n3", "cooccurs_in_sentence"),
        ],
    )
}

#[test]
fn test_same_snapshot_projects_byte_identically() {
    let mut first = GraphStore::new();
    first.commit_snapshot(payload(), None).unwrap();
    let mut second = GraphStore::new();
    second
        .commit_snapshot(payload(), Some(SearchMetadata::FullGraph))
        .unwrap();

    let a = project(first.current()).to_json_string().unwrap();
    let b = project(first.current()).to_json_string().unwrap();
    let c = project(second.current()).to_json_string().unwrap();

    assert_eq!(a, b);
    // Provenance never reaches the drawing.
    assert_eq!(a, c);
}

#[test]
fn test_merged_expansion_appends_to_projection() {
    let mut store = GraphStore::new();
    store.commit_snapshot(payload(), None).unwrap();
    let before = project(store.current());

    store.merge_expansion(
        vec![Node::new("n4", "BERT", "Entity")],
        vec![Edge::new("e3", "n2", "n4", "related_to")],
    );
    let after = project(store.current());

    assert_eq!(after.node_count(), before.node_count() + 1);
    assert_eq!(after.edge_count(), before.edge_count() + 1);
    assert_eq!(after.elements[3].id(), "n4");
    assert_eq!(after.elements.last().unwrap().id(), "e3");
}

#[test]
fn test_empty_snapshot_still_carries_layout_and_style() {
    let store = GraphStore::new();
    let projection = project(store.current());

    assert!(projection.elements.is_empty());
    assert_eq!(projection.style.len(), 2);
    assert_eq!(projection.to_json()["layout"], json!({"name": "cose"}));
}
