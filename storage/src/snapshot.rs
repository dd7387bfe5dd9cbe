use kgview_core::model::{Edge, GraphPayload, Node};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Referential-integrity violations in an incoming graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedGraph {
    #[error("edge {edge_id} references missing node {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },
    #[error("duplicate node id {0}")]
    DuplicateNode(String),
    #[error("duplicate edge id {0}")]
    DuplicateEdge(String),
}

/// The displayed graph. Node and edge order is the order they were received in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    edge_ids: HashSet<String>,
}

/// Outcome of a best-effort merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added_nodes: usize,
    pub added_edges: usize,
    /// Nodes and edges already present by id.
    pub duplicates: usize,
    pub rejected: Vec<MalformedGraph>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.added_nodes > 0 || self.added_edges > 0
    }
}

impl GraphSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot, rejecting the whole graph on the first integrity violation.
    pub fn try_new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, MalformedGraph> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), idx).is_some() {
                return Err(MalformedGraph::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::with_capacity(edges.len());
        for edge in &edges {
            check_endpoints(edge, |id| node_index.contains_key(id))?;
            if !edge_ids.insert(edge.id.clone()) {
                return Err(MalformedGraph::DuplicateEdge(edge.id.clone()));
            }
        }

        Ok(Self {
            nodes,
            edges,
            node_index,
            edge_ids,
        })
    }

    pub fn from_payload(payload: GraphPayload) -> Result<Self, MalformedGraph> {
        Self::try_new(payload.nodes, payload.edges)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Adds unseen nodes first, then unseen edges whose endpoints exist afterwards.
    /// Offending edges are skipped one by one.
    pub(crate) fn merge(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> MergeReport {
        let mut report = MergeReport::default();

        for node in nodes {
            if self.node_index.contains_key(&node.id) {
                report.duplicates += 1;
                continue;
            }
            self.node_index.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node);
            report.added_nodes += 1;
        }

        for edge in edges {
            if self.edge_ids.contains(&edge.id) {
                report.duplicates += 1;
                continue;
            }
            if let Err(err) = check_endpoints(&edge, |id| self.node_index.contains_key(id)) {
                report.rejected.push(err);
                continue;
            }
            self.edge_ids.insert(edge.id.clone());
            self.edges.push(edge);
            report.added_edges += 1;
        }

        report
    }
}

fn check_endpoints(edge: &Edge, has_node: impl Fn(&str) -> bool) -> Result<(), MalformedGraph> {
    for endpoint in [&edge.source, &edge.target] {
        if !has_node(endpoint.as_str()) {
            return Err(MalformedGraph::DanglingEdge {
                edge_id: edge.id.clone(),
                node_id: endpoint.clone(),
            });
        }
    }
    Ok(())
}
