use std::sync::Arc;
use std::time::Duration;

use gateway::{GatewayErrorKind, Operation, ScriptedGateway, ScriptedReply};
use kgview_core::config::{ClientConfig, SurfaceConfig};
use kgview_core::model::{Edge, Entity, GraphPayload, Node, Paper, SearchMetadata};
use kgview_sdk::{Session, SessionError};
use query::{SearchRequest, Settlement, Slot, SlotPhase, SurfacePolicy, TapOutcome};

fn three_node_graph() -> GraphPayload {
    GraphPayload::new(
        vec![
            Node::new("n1", "Attention Is All You Need", "Paper"),
            Node::new("n2", "Transformer", "Entity"),
            Node::new("n3", "Self-Attention", "Entity"),
        ],
        vec![
            Edge::new("e1", "n1", "n2", "mentions"),
            Edge::new("e2", "n2", "n3", "related_to"),
        ],
    )
}

fn session_with(gateway: &Arc<ScriptedGateway>, config: ClientConfig) -> Session {
    Session::with_gateway(config, gateway.clone())
}

#[tokio::test]
async fn test_start_loads_full_graph_and_catalog() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push(Operation::FetchFullGraph, ScriptedReply::Graph(three_node_graph()))
        .push(
            Operation::ListPapers,
            ScriptedReply::Papers(vec![Paper::new("p1", "Attn")]),
        );
    let mut session = session_with(&gateway, ClientConfig::default());

    session.start();
    let settlements = session.settle_pending().await;

    assert_eq!(settlements.len(), 2);
    let view = session.current();
    assert_eq!(view.snapshot.node_count(), 3);
    assert_eq!(view.snapshot.edge_count(), 2);
    assert_eq!(view.metadata, Some(&SearchMetadata::FullGraph));
    assert!(view.selection.is_none());
    assert_eq!(session.catalog().len(), 1);
    assert_eq!(session.projection().elements.len(), 5);
}

#[tokio::test]
async fn test_papers_search_replaces_graph() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push(Operation::FetchFullGraph, ScriptedReply::Graph(three_node_graph()))
        .push(
            Operation::SearchPapers,
            ScriptedReply::Papers(vec![Paper::new("p1", "Attn")]),
        )
        .push(
            Operation::SearchGraph,
            ScriptedReply::Graph(GraphPayload::new(
                vec![Node::new("p1", "p1", "Paper")],
                vec![],
            )),
        );
    let mut session = session_with(&gateway, ClientConfig::default());
    session.load_full_graph();
    session.settle_pending().await;

    session
        .search(SearchRequest::papers("transformer"))
        .unwrap();
    session.settle_pending().await;

    let view = session.current();
    assert_eq!(view.snapshot.node_count(), 1);
    assert_eq!(
        view.metadata,
        Some(&SearchMetadata::Papers {
            papers: vec![Paper::new("p1", "Attn")],
            query: "transformer".to_string(),
        })
    );
}

#[tokio::test]
async fn test_entities_search_leaves_graph_empty() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push(
        Operation::SearchEntities,
        ScriptedReply::Entities(vec![Entity::new("e1", "GPT")]),
    );
    let mut session = session_with(&gateway, ClientConfig::default());

    session.search(SearchRequest::entities("GPT")).unwrap();
    session.settle_pending().await;

    let view = session.current();
    assert!(view.snapshot.is_empty());
    assert_eq!(
        view.metadata,
        Some(&SearchMetadata::Entities {
            entities: vec![Entity::new("e1", "GPT")],
            query: "GPT".to_string(),
        })
    );
}

#[tokio::test]
async fn test_constrained_tap_with_unreachable_expansion() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push(Operation::FetchFullGraph, ScriptedReply::Graph(three_node_graph()))
        .push_failure(
            Operation::FetchNodeExpansion,
            GatewayErrorKind::Unreachable,
            "connection refused",
        );
    let mut session = session_with(&gateway, ClientConfig::default());
    session.load_full_graph();
    session.settle_pending().await;
    let before = session.current().snapshot.clone();

    assert_eq!(session.set_viewport_width(390), SurfacePolicy::Constrained);
    let outcome = session.tap_node("n2").unwrap();
    assert!(matches!(outcome, TapOutcome::Expanding(_)));
    let settlements = session.settle_pending().await;

    assert!(matches!(settlements.as_slice(), [Settlement::Skipped(_)]));
    assert_eq!(session.current().selection.map(|n| n.id.as_str()), Some("n2"));
    assert_eq!(session.current().snapshot, &before);
    assert!(session.last_error().is_none());
    assert_eq!(session.phase(Slot::Expansion), SlotPhase::Failed);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_graph_and_reports() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway
        .push(Operation::FetchFullGraph, ScriptedReply::Graph(three_node_graph()))
        .push_failure(
            Operation::FetchFullGraph,
            GatewayErrorKind::HttpStatus(503),
            "",
        );
    let mut session = session_with(&gateway, ClientConfig::default());
    session.load_full_graph();
    session.settle_pending().await;
    let mut redraws = session.subscribe();
    redraws.borrow_and_update();

    session.load_full_graph();
    session.settle_pending().await;

    assert_eq!(session.current().snapshot.node_count(), 3);
    assert!(session
        .last_error()
        .unwrap()
        .message
        .contains("Loading the graph failed"));
    assert!(!redraws.has_changed().unwrap());

    session.dismiss_error();
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_surface_override_from_config() {
    let gateway = Arc::new(ScriptedGateway::new());
    let config = ClientConfig {
        surface: SurfaceConfig {
            constrained: Some(true),
            ..SurfaceConfig::default()
        },
        ..ClientConfig::default()
    };
    let mut session = session_with(&gateway, config);

    assert_eq!(session.surface_policy(), SurfacePolicy::Constrained);
    assert_eq!(session.set_viewport_width(2560), SurfacePolicy::Constrained);
}

#[test]
fn test_connect_rejects_bad_api_base() {
    let mut config = ClientConfig::default();
    config.gateway.api_base = "localhost without scheme".to_string();

    let err = Session::connect(config).err().unwrap();
    assert!(matches!(err, SessionError::Gateway(_)));
}

#[tokio::test(start_paused = true)]
async fn test_settle_pending_keeps_the_last_issued_view() {
    let gateway = Arc::new(ScriptedGateway::new());
    let slow = Duration::from_millis(200);
    gateway
        .push_delayed(
            Operation::SearchPapers,
            ScriptedReply::Papers(vec![Paper::new("p1", "Attn")]),
            slow,
        )
        .push_delayed(
            Operation::SearchGraph,
            ScriptedReply::Graph(GraphPayload::new(
                vec![Node::new("s1", "Search hit", "Paper")],
                vec![],
            )),
            slow,
        )
        .push(Operation::FetchFullGraph, ScriptedReply::Graph(three_node_graph()));
    let mut session = session_with(&gateway, ClientConfig::default());

    session.search(SearchRequest::papers("attention")).unwrap();
    session.load_full_graph();
    let settlements = session.settle_pending().await;

    assert!(matches!(
        settlements.as_slice(),
        [Settlement::Committed(_), Settlement::Discarded(_)]
    ));
    let view = session.current();
    assert_eq!(view.snapshot.node_count(), 3);
    assert_eq!(view.metadata, Some(&SearchMetadata::FullGraph));
}
