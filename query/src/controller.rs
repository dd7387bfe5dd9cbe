use crate::diagnostics::Diagnostic;
use crate::dsl::{validate_paper_id, QueryError, SearchMode, SearchRequest};
use crate::slot::{Slot, SlotPhase, SlotTable, Ticket};
use gateway::{DocumentUpload, Gateway, GatewayError};
use kgview_core::model::{GraphPayload, Paper, SearchMetadata};
use std::future::Future;
use std::sync::Arc;
use storage::GraphStore;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What a finished request wants done to the store.
#[derive(Debug)]
enum Outcome {
    Replace {
        payload: GraphPayload,
        metadata: Option<SearchMetadata>,
    },
    Merge {
        payload: GraphPayload,
        generation: u64,
    },
    Catalog(Vec<Paper>),
}

#[derive(Debug, Error)]
enum RequestFailure {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The request task panicked or was cancelled before answering.
    #[error("request task ended without an answer: {0}")]
    Aborted(String),
}

/// A finished request waiting to be applied by the store's owner.
#[derive(Debug)]
pub struct Completion {
    ticket: Ticket,
    result: Result<Outcome, RequestFailure>,
}

impl Completion {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Committed(Ticket),
    /// Superseded by a newer request in the same slot, by a newer graph-replacing
    /// request in another slot, or aimed at a replaced snapshot.
    Discarded(Ticket),
    Failed(Diagnostic),
    /// A failure that is deliberately not shown to the user.
    Skipped(Ticket),
}

/// Issues backend requests as tokio tasks and applies their completions to a
/// [`GraphStore`] in arrival order, dropping any that a newer request in the
/// same slot, or a newer graph-replacing request, has superseded.
pub struct QueryController {
    gateway: Arc<dyn Gateway>,
    api_base: String,
    slots: SlotTable,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    catalog: Vec<Paper>,
    last_error: Option<Diagnostic>,
}

impl QueryController {
    /// `api_base` is only used to word diagnostics.
    pub fn new(gateway: Arc<dyn Gateway>, api_base: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            api_base: api_base.into(),
            slots: SlotTable::default(),
            tx,
            rx,
            catalog: Vec::new(),
            last_error: None,
        }
    }

    pub fn load_full_graph(&mut self) -> Ticket {
        let gateway = self.gateway.clone();
        self.spawn(Slot::FullGraph, async move {
            let payload = gateway.fetch_full_graph().await?;
            Ok::<_, GatewayError>(Outcome::Replace {
                payload,
                metadata: Some(SearchMetadata::FullGraph),
            })
        })
    }

    pub fn search(&mut self, request: SearchRequest) -> Result<Ticket, QueryError> {
        request.validate()?;
        let query = request.trimmed_query().to_string();
        let gateway = self.gateway.clone();

        let ticket = match request.mode {
            SearchMode::Papers => self.spawn(Slot::Search, async move {
                let (papers, payload) = tokio::try_join!(
                    gateway.search_papers(&query),
                    gateway.search_graph(&query)
                )?;
                Ok::<_, GatewayError>(Outcome::Replace {
                    payload,
                    metadata: Some(SearchMetadata::Papers { papers, query }),
                })
            }),
            SearchMode::Entities => self.spawn(Slot::Search, async move {
                let entities = gateway.search_entities(&query).await?;
                Ok::<_, GatewayError>(Outcome::Replace {
                    payload: GraphPayload::empty(),
                    metadata: Some(SearchMetadata::Entities { entities, query }),
                })
            }),
        };
        Ok(ticket)
    }

    pub fn view_paper(&mut self, paper_id: &str) -> Result<Ticket, QueryError> {
        let paper_id = validate_paper_id(paper_id)?.to_string();
        let gateway = self.gateway.clone();
        Ok(self.spawn(Slot::PaperGraph, async move {
            let payload = gateway.fetch_paper_graph(&paper_id).await?;
            Ok::<_, GatewayError>(Outcome::Replace {
                payload,
                metadata: Some(SearchMetadata::SinglePaper { paper_id }),
            })
        }))
    }

    /// Uploads the document, then turns its extracted text into a graph.
    /// A failure at either step leaves the store untouched.
    pub fn upload(&mut self, upload: DocumentUpload) -> Result<Ticket, QueryError> {
        upload.validate()?;
        let gateway = self.gateway.clone();
        Ok(self.spawn(Slot::Upload, async move {
            let text = gateway.upload_document(&upload).await?;
            let payload = gateway.process_text(&text).await?;
            Ok::<_, GatewayError>(Outcome::Replace {
                payload,
                metadata: None,
            })
        }))
    }

    pub fn refresh_catalog(&mut self) -> Ticket {
        let gateway = self.gateway.clone();
        self.spawn(Slot::PaperList, async move {
            Ok::<_, GatewayError>(Outcome::Catalog(gateway.list_papers().await?))
        })
    }

    /// The result is merged only if the store still holds the snapshot of `generation`.
    pub fn expand(&mut self, node_id: &str, generation: u64) -> Ticket {
        let node_id = node_id.to_string();
        let gateway = self.gateway.clone();
        self.spawn(Slot::Expansion, async move {
            let payload = gateway.fetch_node_expansion(&node_id).await?;
            Ok::<_, GatewayError>(Outcome::Merge {
                payload,
                generation,
            })
        })
    }

    fn spawn<F>(&mut self, slot: Slot, request: F) -> Ticket
    where
        F: Future<Output = Result<Outcome, GatewayError>> + Send + 'static,
    {
        let ticket = self.slots.issue(slot);
        debug!(slot = %slot, token = ticket.token, "request issued");

        let tx = self.tx.clone();
        let task = tokio::spawn(request);
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result.map_err(RequestFailure::from),
                Err(err) => Err(RequestFailure::Aborted(err.to_string())),
            };
            // The receiver lives as long as the controller.
            let _ = tx.send(Completion { ticket, result });
        });
        ticket
    }

    /// Waits for the next finished request.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    pub async fn next_settlement(&mut self, store: &mut GraphStore) -> Option<Settlement> {
        let completion = self.next_completion().await?;
        Some(self.settle(store, completion))
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn settle_ready(&mut self, store: &mut GraphStore) -> Vec<Settlement> {
        let mut settlements = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            settlements.push(self.settle(store, completion));
        }
        settlements
    }

    pub fn settle(&mut self, store: &mut GraphStore, completion: Completion) -> Settlement {
        let Completion { ticket, result } = completion;
        if !self.slots.is_latest(ticket) {
            debug!(slot = %ticket.slot, token = ticket.token, "stale response discarded");
            // A no-op unless a request in another slot superseded this one.
            self.slots.finish(ticket, SlotPhase::Idle);
            return Settlement::Discarded(ticket);
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if ticket.slot == Slot::Expansion => {
                debug!(error = %err, "expansion failed, skipped");
                self.slots.finish(ticket, SlotPhase::Failed);
                return Settlement::Skipped(ticket);
            }
            Err(RequestFailure::Gateway(err)) => {
                let diagnostic = Diagnostic::from_gateway(ticket.slot, &err, &self.api_base);
                return self.fail(ticket, diagnostic);
            }
            Err(RequestFailure::Aborted(detail)) => {
                warn!(slot = %ticket.slot, detail = %detail, "request task aborted");
                return self.fail(ticket, Diagnostic::aborted(ticket.slot));
            }
        };

        match outcome {
            Outcome::Replace { payload, metadata } => {
                let (nodes, edges) = (payload.nodes.len(), payload.edges.len());
                if let Err(err) = store.commit_snapshot(payload, metadata) {
                    let diagnostic = Diagnostic::from_store(ticket.slot, &err);
                    return self.fail(ticket, diagnostic);
                }
                info!(slot = %ticket.slot, nodes, edges, "snapshot committed");
                self.last_error = None;
            }
            Outcome::Merge {
                payload,
                generation,
            } => {
                if generation != store.generation() {
                    debug!(
                        expected = generation,
                        current = store.generation(),
                        "expansion aimed at a replaced snapshot, discarded"
                    );
                    self.slots.finish(ticket, SlotPhase::Settled);
                    return Settlement::Discarded(ticket);
                }
                let report = store.merge_expansion(payload.nodes, payload.edges);
                info!(
                    added_nodes = report.added_nodes,
                    added_edges = report.added_edges,
                    rejected = report.rejected.len(),
                    "expansion merged"
                );
            }
            Outcome::Catalog(papers) => {
                info!(papers = papers.len(), "paper catalog refreshed");
                self.catalog = papers;
            }
        }

        self.slots.finish(ticket, SlotPhase::Settled);
        Settlement::Committed(ticket)
    }

    fn fail(&mut self, ticket: Ticket, diagnostic: Diagnostic) -> Settlement {
        warn!(slot = %ticket.slot, code = %diagnostic.code, "{}", diagnostic.message);
        self.slots.finish(ticket, SlotPhase::Failed);
        self.last_error = Some(diagnostic.clone());
        Settlement::Failed(diagnostic)
    }

    pub fn phase(&self, slot: Slot) -> SlotPhase {
        self.slots.phase(slot)
    }

    pub fn is_loading(&self) -> bool {
        self.slots.any_pending()
    }

    pub fn catalog(&self) -> &[Paper] {
        &self.catalog
    }

    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}
