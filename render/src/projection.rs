use crate::style::{default_style, StyleRule};
use kgview_core::model::Props;
use serde::Serialize;
use storage::GraphView;

pub const DEFAULT_LAYOUT: &str = "cose";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePrimitive {
    pub id: String,
    pub label: String,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgePrimitive {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group", content = "data")]
pub enum Element {
    #[serde(rename = "nodes")]
    Node(NodePrimitive),
    #[serde(rename = "edges")]
    Edge(EdgePrimitive),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Node(node) => &node.id,
            Element::Edge(edge) => &edge.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub name: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            name: DEFAULT_LAYOUT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub elements: Vec<Element>,
    pub layout: Layout,
    pub style: Vec<StyleRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl Projection {
    pub fn node_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|element| matches!(element, Element::Node(_)))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.elements.len() - self.node_count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Every field is a string, a JSON value or a list of those.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Nodes in snapshot order, then edges in snapshot order. Pure: the same view
/// always yields the same projection.
pub fn project(view: GraphView<'_>) -> Projection {
    let snapshot = view.snapshot;
    let mut elements = Vec::with_capacity(snapshot.node_count() + snapshot.edge_count());

    elements.extend(snapshot.nodes().iter().map(|node| {
        Element::Node(NodePrimitive {
            id: node.id.clone(),
            label: node.label.clone(),
            props: node.props.clone(),
        })
    }));
    elements.extend(snapshot.edges().iter().map(|edge| {
        Element::Edge(EdgePrimitive {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
        })
    }));

    Projection {
        elements,
        layout: Layout::default(),
        style: default_style(),
        selected: view.selection.map(|node| node.id.clone()),
    }
}
