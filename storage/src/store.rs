use crate::snapshot::{GraphSnapshot, MalformedGraph, MergeReport};
use kgview_core::error::{ErrorCode, KgError};
use kgview_core::model::{Edge, GraphPayload, Node, SearchMetadata};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("malformed graph: {0}")]
    MalformedGraph(#[from] MalformedGraph),
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

impl KgError for StoreError {
    fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::MalformedGraph(_) => ErrorCode::MalformedResponse,
            StoreError::UnknownNode(_) => ErrorCode::NotFound,
        }
    }
}

/// Read-only view handed out by [`GraphStore::current`].
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    pub snapshot: &'a GraphSnapshot,
    pub selection: Option<&'a Node>,
    pub metadata: Option<&'a SearchMetadata>,
}

/// Sole owner of the displayed snapshot, its provenance and the selection.
///
/// Every successful mutation publishes a new revision on a watch channel so
/// renderers can redraw; mutations that change nothing stay silent.
pub struct GraphStore {
    snapshot: GraphSnapshot,
    metadata: Option<SearchMetadata>,
    selection: Option<String>,
    generation: u64,
    revision: watch::Sender<u64>,
}

impl GraphStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            snapshot: GraphSnapshot::empty(),
            metadata: None,
            selection: None,
            generation: 0,
            revision,
        }
    }

    pub fn current(&self) -> GraphView<'_> {
        GraphView {
            snapshot: &self.snapshot,
            selection: self
                .selection
                .as_deref()
                .and_then(|id| self.snapshot.node(id)),
            metadata: self.metadata.as_ref(),
        }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn metadata(&self) -> Option<&SearchMetadata> {
        self.metadata.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Bumped on every snapshot replacement, never by merges or selection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn replace_snapshot(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<(), StoreError> {
        self.commit_snapshot(GraphPayload::new(nodes, edges), None)
    }

    /// Validates and swaps in a new snapshot, replacing the metadata when one is given.
    /// Nothing changes if validation fails.
    pub fn commit_snapshot(
        &mut self,
        payload: GraphPayload,
        metadata: Option<SearchMetadata>,
    ) -> Result<(), StoreError> {
        let snapshot = GraphSnapshot::from_payload(payload)?;

        if let Some(selected) = &self.selection {
            if !snapshot.contains_node(selected) {
                debug!(node_id = %selected, "selection dropped by snapshot replacement");
                self.selection = None;
            }
        }
        self.snapshot = snapshot;
        if let Some(metadata) = metadata {
            self.metadata = Some(metadata);
        }
        self.generation += 1;
        self.notify();
        Ok(())
    }

    pub fn merge_expansion(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> MergeReport {
        let report = self.snapshot.merge(nodes, edges);
        for rejected in &report.rejected {
            debug!(error = %rejected, "expansion edge skipped");
        }
        if report.changed() {
            self.notify();
        }
        report
    }

    pub fn select(&mut self, node_id: Option<&str>) -> Result<(), StoreError> {
        match node_id {
            Some(id) if !self.snapshot.contains_node(id) => {
                Err(StoreError::UnknownNode(id.to_string()))
            }
            Some(id) => {
                if self.selection.as_deref() != Some(id) {
                    self.selection = Some(id.to_string());
                    self.notify();
                }
                Ok(())
            }
            None => {
                if self.selection.take().is_some() {
                    self.notify();
                }
                Ok(())
            }
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
