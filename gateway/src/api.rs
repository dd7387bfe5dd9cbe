//! Wire records for the backend's JSON bodies and their normalisation into model types.

use kgview_core::model::{
    Edge, Entity, GraphPayload, Node, Paper, Props, DEFAULT_NODE_TYPE, DEFAULT_RELATION,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MIME_TYPE: &str = "application/pdf";
const MAX_DETAIL_LEN: usize = 200;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("invalid mime type for document upload: {actual_mime_type} (expected application/pdf)")]
    InvalidMimeType { actual_mime_type: String },
    #[error("document name must end with .pdf: {0}")]
    InvalidFilename(String),
    #[error("document {0} is empty")]
    EmptyDocument(String),
}

/// A document picked by the user for upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl DocumentUpload {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            mime_type: PDF_MIME_TYPE.to_string(),
        }
    }

    /// The backend only extracts text from PDFs; reject anything else before sending.
    pub fn validate(&self) -> Result<(), UploadError> {
        let normalized_mime = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if normalized_mime != PDF_MIME_TYPE {
            return Err(UploadError::InvalidMimeType {
                actual_mime_type: self.mime_type.clone(),
            });
        }
        if !self.filename.to_lowercase().ends_with(".pdf") {
            return Err(UploadError::InvalidFilename(self.filename.clone()));
        }
        if self.content.is_empty() {
            return Err(UploadError::EmptyDocument(self.filename.clone()));
        }
        Ok(())
    }
}

/// Ids arrive as strings from the graph store but may be numeric in hand-built payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(id) => id,
            WireId::Number(id) => id.to_string(),
        }
    }
}

fn required_id(id: Option<WireId>) -> Option<String> {
    id.map(WireId::into_string)
        .filter(|id| !id.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeRecord {
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    props: Option<Props>,
}

impl NodeRecord {
    /// `None` when the record carries no usable id.
    fn into_node(self) -> Option<Node> {
        let id = required_id(self.id)?;
        let label = self
            .label
            .or(self.name)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| id.clone());
        Some(Node {
            label,
            kind: self.kind.unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
            props: self.props.unwrap_or_default(),
            id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EdgeRecord {
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    source: Option<WireId>,
    #[serde(default)]
    target: Option<WireId>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    props: Option<Props>,
}

impl EdgeRecord {
    /// `None` when either endpoint is missing.
    fn into_edge(self, index: usize) -> Option<Edge> {
        let source = required_id(self.source)?;
        let target = required_id(self.target)?;
        let label = self
            .label
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_RELATION.to_string());
        // Text-processing results carry no edge ids; the position keeps repeated relations apart.
        let id = required_id(self.id)
            .unwrap_or_else(|| format!("{}-{}-{}#{}", source, label, target, index));
        Some(Edge {
            id,
            source,
            target,
            label,
            props: self.props.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse {
    #[serde(default)]
    nodes: Option<Vec<NodeRecord>>,
    #[serde(default)]
    edges: Option<Vec<EdgeRecord>>,
}

impl GraphResponse {
    /// Keeps the first record per id. Nodes without an id and edges missing an
    /// endpoint are dropped. Undirected graph queries report each relationship
    /// once per direction under the same id.
    pub(crate) fn into_payload(self) -> GraphPayload {
        let mut node_ids = HashSet::new();
        let mut nodes = Vec::new();
        let mut nameless = 0usize;
        for record in self.nodes.unwrap_or_default() {
            let Some(node) = record.into_node() else {
                nameless += 1;
                continue;
            };
            if node_ids.insert(node.id.clone()) {
                nodes.push(node);
            } else {
                debug!(node_id = %node.id, "repeated node dropped");
            }
        }

        let mut edge_ids = HashSet::new();
        let mut edges = Vec::new();
        let mut unanchored = 0usize;
        for (index, record) in self.edges.unwrap_or_default().into_iter().enumerate() {
            let Some(edge) = record.into_edge(index) else {
                unanchored += 1;
                continue;
            };
            if edge_ids.insert(edge.id.clone()) {
                edges.push(edge);
            } else {
                debug!(edge_id = %edge.id, "repeated edge dropped");
            }
        }

        if nameless > 0 || unanchored > 0 {
            warn!(
                nodes = nameless,
                edges = unanchored,
                "graph records without ids dropped"
            );
        }
        GraphPayload::new(nodes, edges)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PapersResponse {
    #[serde(default)]
    papers: Option<Vec<Paper>>,
}

impl PapersResponse {
    pub(crate) fn into_papers(self) -> Vec<Paper> {
        self.papers.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityRecord {
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    props: Option<Props>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntitiesResponse {
    #[serde(default)]
    entities: Option<Vec<EntityRecord>>,
}

impl EntitiesResponse {
    pub(crate) fn into_entities(self) -> Result<Vec<Entity>, String> {
        self.entities
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, record)| -> Result<Entity, String> {
                let id = required_id(record.id)
                    .ok_or_else(|| format!("entity #{} has no id", index))?;
                Ok(Entity {
                    name: record.name.unwrap_or_else(|| id.clone()),
                    kind: record.kind.unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
                    props: record.props.unwrap_or_default(),
                    id,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    text_snippet: Option<String>,
}

impl UploadResponse {
    pub(crate) fn into_text(self) -> String {
        self.text_snippet.unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProcessTextRequest<'a> {
    pub text: &'a str,
}

/// Pulls the human-readable `detail` out of an error body, falling back to the raw text.
pub(crate) fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    };
    truncate(detail, MAX_DETAIL_LEN)
}

fn truncate(mut text: String, max_len: usize) -> String {
    if text.len() > max_len {
        let mut cut = max_len;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_response_normalises_text_processing_dialect() {
        let raw = r#"{
            "nodes": [
                {"id": "ent-0-4", "name": "BERT", "type": "ORG", "props": {"start": 0, "end": 4}},
                {"id": "ent-9-13", "name": "GPT", "type": "ORG"}
            ],
            "edges": [
                {"source": "ent-0-4", "target": "ent-9-13", "label": "cooccurs_in_sentence"},
                {"source": "ent-0-4", "target": "ent-9-13", "label": "cooccurs_in_sentence"}
            ]
        }"#;
        let payload = serde_json::from_str::<GraphResponse>(raw)
            .unwrap()
            .into_payload();

        assert_eq!(payload.nodes[0].label, "BERT");
        assert_eq!(payload.nodes[0].props["end"], 4);
        assert_eq!(payload.edges[0].id, "ent-0-4-cooccurs_in_sentence-ent-9-13#0");
        assert_ne!(payload.edges[0].id, payload.edges[1].id);
    }

    #[test]
    fn graph_response_defaults_missing_fields() {
        let raw = r#"{"nodes": [{"id": 7, "label": null, "props": null}], "edges": null}"#;
        let payload = serde_json::from_str::<GraphResponse>(raw)
            .unwrap()
            .into_payload();

        assert_eq!(payload.nodes[0].id, "7");
        assert_eq!(payload.nodes[0].label, "7");
        assert_eq!(payload.nodes[0].kind, DEFAULT_NODE_TYPE);
        assert!(payload.edges.is_empty());

        let missing = serde_json::from_str::<GraphResponse>("{}").unwrap();
        assert!(missing.into_payload().is_empty());
    }

    #[test]
    fn graph_response_drops_records_without_ids() {
        let raw = r#"{
            "nodes": [
                {"id": null, "label": null, "type": "Paper", "props": {"paper_id": "p1"}},
                {"id": "e1", "label": "BERT", "type": "Entity"},
                {"label": "orphan"}
            ],
            "edges": [
                {"id": "3", "source": null, "target": "e1", "label": "CONTAINS"},
                {"id": "4", "source": "e1", "target": "  ", "label": "CONTAINS"}
            ]
        }"#;
        let payload = serde_json::from_str::<GraphResponse>(raw)
            .unwrap()
            .into_payload();

        assert_eq!(payload.nodes.len(), 1);
        assert_eq!(payload.nodes[0].id, "e1");
        assert!(payload.edges.is_empty());
    }

    #[test]
    fn graph_response_keeps_first_of_repeated_ids() {
        let raw = r#"{
            "nodes": [
                {"id": "a", "label": "A"},
                {"id": "b", "label": "B"},
                {"id": "a", "label": "A again"}
            ],
            "edges": [
                {"id": "7", "source": "a", "target": "b", "label": "RELATED_TO"},
                {"id": "7", "source": "b", "target": "a", "label": "RELATED_TO"}
            ]
        }"#;
        let payload = serde_json::from_str::<GraphResponse>(raw)
            .unwrap()
            .into_payload();

        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[0].label, "A");
        assert_eq!(payload.edges.len(), 1);
        assert_eq!(payload.edges[0].source, "a");
        assert_eq!(payload.edges[0].target, "b");
    }

    #[test]
    fn upload_accepts_only_pdf() {
        assert!(DocumentUpload::pdf("paper.PDF", vec![1, 2, 3]).validate().is_ok());

        let mut upload = DocumentUpload::pdf("notes.txt", vec![1]);
        upload.mime_type = "text/plain".to_string();
        assert!(matches!(
            upload.validate(),
            Err(UploadError::InvalidMimeType { .. })
        ));

        let upload = DocumentUpload::pdf("notes.txt", vec![1]);
        assert_eq!(
            upload.validate(),
            Err(UploadError::InvalidFilename("notes.txt".to_string()))
        );

        let upload = DocumentUpload::pdf("empty.pdf", Vec::new());
        assert_eq!(
            upload.validate(),
            Err(UploadError::EmptyDocument("empty.pdf".to_string()))
        );
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Only PDF files are accepted"}"#),
            "Only PDF files are accepted"
        );
        assert_eq!(error_detail("  Internal Server Error "), "Internal Server Error");
        assert!(error_detail(r#"{"detail":[{"loc":["query","q"]}]}"#).contains("loc"));
    }
}
