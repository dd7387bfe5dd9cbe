//! In-memory [`Gateway`] answering from scripted replies.

use crate::api::DocumentUpload;
use crate::client::Gateway;
use crate::error::{GatewayError, GatewayErrorKind, Operation};
use async_trait::async_trait;
use kgview_core::model::{Entity, GraphPayload, Paper};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Graph(GraphPayload),
    Papers(Vec<Paper>),
    Entities(Vec<Entity>),
    Text(String),
    Failure(GatewayErrorKind, String),
}

/// One recorded call: the operation and its id, query or text argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub operation: Operation,
    pub argument: Option<String>,
}

#[derive(Debug, Clone)]
struct Scripted {
    reply: ScriptedReply,
    delay: Option<Duration>,
}

#[derive(Default)]
struct ScriptState {
    queued: HashMap<Operation, VecDeque<Scripted>>,
    standing: HashMap<Operation, Scripted>,
    calls: Vec<GatewayCall>,
}

/// Queued replies are consumed in order per operation; once a queue is empty the
/// standing reply (if any) answers every further call. Unscripted calls fail as
/// `Unreachable`.
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, operation: Operation, reply: ScriptedReply) -> &Self {
        self.enqueue(operation, Scripted { reply, delay: None })
    }

    /// The reply is released only after `delay` has elapsed.
    pub fn push_delayed(
        &self,
        operation: Operation,
        reply: ScriptedReply,
        delay: Duration,
    ) -> &Self {
        self.enqueue(
            operation,
            Scripted {
                reply,
                delay: Some(delay),
            },
        )
    }

    pub fn push_failure(
        &self,
        operation: Operation,
        kind: GatewayErrorKind,
        detail: impl Into<String>,
    ) -> &Self {
        self.push(operation, ScriptedReply::Failure(kind, detail.into()))
    }

    pub fn set_standing(&self, operation: Operation, reply: ScriptedReply) -> &Self {
        self.lock()
            .standing
            .insert(operation, Scripted { reply, delay: None });
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn enqueue(&self, operation: Operation, scripted: Scripted) -> &Self {
        self.lock()
            .queued
            .entry(operation)
            .or_default()
            .push_back(scripted);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn answer(
        &self,
        operation: Operation,
        argument: Option<&str>,
    ) -> Result<ScriptedReply, GatewayError> {
        let scripted = {
            let mut state = self.lock();
            state.calls.push(GatewayCall {
                operation,
                argument: argument.map(str::to_string),
            });
            let queued = state.queued.get_mut(&operation).and_then(VecDeque::pop_front);
            queued.or_else(|| state.standing.get(&operation).cloned())
        };

        let Some(Scripted { reply, delay }) = scripted else {
            return Err(GatewayError::unreachable(
                operation,
                "no scripted reply for this operation",
            ));
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            ScriptedReply::Failure(kind, detail) => Err(GatewayError::new(operation, kind, detail)),
            reply => Ok(reply),
        }
    }

    async fn graph(
        &self,
        operation: Operation,
        argument: Option<&str>,
    ) -> Result<GraphPayload, GatewayError> {
        match self.answer(operation, argument).await? {
            ScriptedReply::Graph(payload) => Ok(payload),
            other => Err(mismatch(operation, &other)),
        }
    }

    async fn papers(
        &self,
        operation: Operation,
        argument: Option<&str>,
    ) -> Result<Vec<Paper>, GatewayError> {
        match self.answer(operation, argument).await? {
            ScriptedReply::Papers(papers) => Ok(papers),
            other => Err(mismatch(operation, &other)),
        }
    }
}

fn mismatch(operation: Operation, reply: &ScriptedReply) -> GatewayError {
    let shape = match reply {
        ScriptedReply::Graph(_) => "graph",
        ScriptedReply::Papers(_) => "papers",
        ScriptedReply::Entities(_) => "entities",
        ScriptedReply::Text(_) => "text",
        ScriptedReply::Failure(..) => "failure",
    };
    GatewayError::malformed(operation, format!("scripted {} reply does not fit", shape))
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn fetch_full_graph(&self) -> Result<GraphPayload, GatewayError> {
        self.graph(Operation::FetchFullGraph, None).await
    }

    async fn fetch_node_expansion(&self, node_id: &str) -> Result<GraphPayload, GatewayError> {
        self.graph(Operation::FetchNodeExpansion, Some(node_id)).await
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>, GatewayError> {
        self.papers(Operation::SearchPapers, Some(query)).await
    }

    async fn search_graph(&self, query: &str) -> Result<GraphPayload, GatewayError> {
        self.graph(Operation::SearchGraph, Some(query)).await
    }

    async fn search_entities(&self, query: &str) -> Result<Vec<Entity>, GatewayError> {
        let operation = Operation::SearchEntities;
        match self.answer(operation, Some(query)).await? {
            ScriptedReply::Entities(entities) => Ok(entities),
            other => Err(mismatch(operation, &other)),
        }
    }

    async fn fetch_paper_graph(&self, paper_id: &str) -> Result<GraphPayload, GatewayError> {
        self.graph(Operation::FetchPaperGraph, Some(paper_id)).await
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, GatewayError> {
        self.papers(Operation::ListPapers, None).await
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError> {
        let operation = Operation::UploadDocument;
        match self.answer(operation, Some(upload.filename.as_str())).await? {
            ScriptedReply::Text(text) => Ok(text),
            other => Err(mismatch(operation, &other)),
        }
    }

    async fn process_text(&self, text: &str) -> Result<GraphPayload, GatewayError> {
        self.graph(Operation::ProcessText, Some(text)).await
    }
}
