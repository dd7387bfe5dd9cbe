use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Freeform node/edge metadata as delivered by the backend (authors, year, journal, spans, ...).
pub type Props = Map<String, Value>;

pub const DEFAULT_NODE_TYPE: &str = "Entity";
pub const DEFAULT_RELATION: &str = "RELATED_TO";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub props: Props,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: kind.into(),
            props: Props::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Props,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: label.into(),
            props: Props::new(),
        }
    }
}

/// `{nodes, edges}` body shared by every graph endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphPayload {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Author field as stored in the paper index: either a preformatted string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authors {
    List(Vec<String>),
    Single(String),
}

impl fmt::Display for Authors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authors::List(names) => write!(f, "{}", names.join(", ")),
            Authors::Single(names) => write!(f, "{}", names),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicationYear {
    Number(i64),
    Text(String),
}

impl fmt::Display for PublicationYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationYear::Number(year) => write!(f, "{}", year),
            PublicationYear::Text(year) => write!(f, "{}", year),
        }
    }
}

/// Paper record from `/papers` and `/papers/search`. Only `paper_id` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub paper_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Authors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<PublicationYear>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

impl Paper {
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: Some(title.into()),
            authors: None,
            year: None,
            journal: None,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled",
        }
    }
}

/// Entity record from `/entities/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,
    #[serde(default)]
    pub props: Props,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: DEFAULT_NODE_TYPE.to_string(),
            props: Props::new(),
        }
    }
}

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

/// Provenance of the displayed snapshot. Drives the side panel, never the rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchMetadata {
    FullGraph,
    Papers { papers: Vec<Paper>, query: String },
    Entities { entities: Vec<Entity>, query: String },
    SinglePaper { paper_id: String },
}

impl SearchMetadata {
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchMetadata::Papers { query, .. } | SearchMetadata::Entities { query, .. } => {
                Some(query)
            }
            _ => None,
        }
    }

    /// Number of hits reported in the side panel, for search provenances only.
    pub fn result_count(&self) -> Option<usize> {
        match self {
            SearchMetadata::Papers { papers, .. } => Some(papers.len()),
            SearchMetadata::Entities { entities, .. } => Some(entities.len()),
            _ => None,
        }
    }

    pub fn focused_paper(&self) -> Option<&str> {
        match self {
            SearchMetadata::SinglePaper { paper_id } => Some(paper_id),
            _ => None,
        }
    }
}
