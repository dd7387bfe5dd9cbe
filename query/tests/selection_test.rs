use std::sync::Arc;
use std::time::Duration;

use gateway::{GatewayErrorKind, Operation, ScriptedGateway, ScriptedReply};
use kgview_core::config::SurfaceConfig;
use kgview_core::model::{Edge, GraphPayload, Node};
use query::{QueryController, SelectionHandler, Settlement, TapOutcome};
use storage::{GraphStore, StoreError};

fn seeded_store() -> GraphStore {
    let mut store = GraphStore::new();
    store
        .replace_snapshot(
            vec![
                Node::new("n1", "Attention Is All You Need", "Paper"),
                Node::new("n2", "Transformer", "Entity"),
            ],
            vec![Edge::new("e1", "n1", "n2", "mentions")],
        )
        .unwrap();
    store
}

fn neighbourhood() -> GraphPayload {
    GraphPayload::new(
        vec![
            Node::new("n2", "Transformer", "Entity"),
            Node::new("n3", "BERT", "Entity"),
        ],
        vec![Edge::new("e2", "n2", "n3", "related_to")],
    )
}

fn constrained() -> SelectionHandler {
    SelectionHandler::new(SurfaceConfig {
        constrained: Some(true),
        ..SurfaceConfig::default()
    })
}

fn setup() -> (Arc<ScriptedGateway>, QueryController) {
    let gateway = Arc::new(ScriptedGateway::new());
    let controller = QueryController::new(gateway.clone(), "http://localhost:8000");
    (gateway, controller)
}

#[tokio::test]
async fn test_tap_on_full_surface_only_selects() {
    let (gateway, mut controller) = setup();
    let mut store = seeded_store();
    let mut handler = SelectionHandler::new(SurfaceConfig::default());
    handler.set_viewport_width(1440);

    let outcome = handler.tap(&mut store, &mut controller, "n2").unwrap();

    assert_eq!(outcome, TapOutcome::Selected);
    assert_eq!(store.selected_id(), Some("n2"));
    assert!(gateway.calls().is_empty());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_tap_on_constrained_surface_merges_neighbourhood() {
    let (gateway, mut controller) = setup();
    let mut store = seeded_store();
    gateway.push(
        Operation::FetchNodeExpansion,
        ScriptedReply::Graph(neighbourhood()),
    );

    let outcome = constrained().tap(&mut store, &mut controller, "n2").unwrap();
    let TapOutcome::Expanding(ticket) = outcome else {
        panic!("expected an expansion, got {:?}", outcome);
    };
    let settlement = controller.next_settlement(&mut store).await.unwrap();

    assert_eq!(settlement, Settlement::Committed(ticket));
    assert_eq!(store.snapshot().node_count(), 3);
    assert_eq!(store.snapshot().edge_count(), 2);
    assert_eq!(store.selected_id(), Some("n2"));
    assert_eq!(gateway.calls()[0].argument.as_deref(), Some("n2"));
}

#[tokio::test]
async fn test_tap_on_unknown_node_is_rejected() {
    let (gateway, mut controller) = setup();
    let mut store = seeded_store();

    let err = constrained()
        .tap(&mut store, &mut controller, "ghost")
        .unwrap_err();

    assert_eq!(err, StoreError::UnknownNode("ghost".to_string()));
    assert!(store.selected_id().is_none());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_failed_expansion_is_skipped_silently() {
    let (gateway, mut controller) = setup();
    let mut store = seeded_store();
    let before = store.snapshot().clone();
    gateway.push_failure(
        Operation::FetchNodeExpansion,
        GatewayErrorKind::HttpStatus(404),
        "Node not found",
    );

    constrained().tap(&mut store, &mut controller, "n1").unwrap();
    let settlement = controller.next_settlement(&mut store).await.unwrap();

    assert!(matches!(settlement, Settlement::Skipped(_)));
    assert!(controller.last_error().is_none());
    assert_eq!(store.snapshot(), &before);
    assert_eq!(store.selected_id(), Some("n1"));
}

#[tokio::test(start_paused = true)]
async fn test_expansion_for_replaced_snapshot_is_discarded() {
    let (gateway, mut controller) = setup();
    let mut store = seeded_store();
    gateway
        .push_delayed(
            Operation::FetchNodeExpansion,
            ScriptedReply::Graph(neighbourhood()),
            Duration::from_millis(50),
        )
        .push(
            Operation::FetchFullGraph,
            ScriptedReply::Graph(GraphPayload::new(
                vec![Node::new("n2", "Transformer", "Entity")],
                vec![],
            )),
        );

    let TapOutcome::Expanding(expansion) =
        constrained().tap(&mut store, &mut controller, "n2").unwrap()
    else {
        panic!("expected an expansion");
    };
    let reload = controller.load_full_graph();

    assert_eq!(
        controller.next_settlement(&mut store).await.unwrap(),
        Settlement::Committed(reload)
    );
    assert_eq!(
        controller.next_settlement(&mut store).await.unwrap(),
        Settlement::Discarded(expansion)
    );
    assert_eq!(store.snapshot().node_count(), 1);
    assert!(!store.snapshot().contains_node("n3"));
}
