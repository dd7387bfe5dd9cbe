//! One knowledge-graph viewing session: the store, the controller that feeds it
//! and the selection handler, owned together.

use gateway::{DocumentUpload, Gateway, GatewayBuildError, HttpGateway};
use kgview_core::config::ClientConfig;
use kgview_core::error::{ErrorCode, KgError};
use kgview_core::model::Paper;
use query::{
    Diagnostic, QueryController, QueryError, SearchRequest, SelectionHandler, Settlement, Slot,
    SlotPhase, SurfacePolicy, TapOutcome, Ticket,
};
use render::Projection;
use std::sync::Arc;
use storage::{GraphStore, GraphView, StoreError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

pub use kgview_core::init_tracing;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayBuildError),
}

impl KgError for SessionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SessionError::Config(_) => ErrorCode::InvalidArgument,
            SessionError::Gateway(GatewayBuildError::InvalidBaseUrl { .. }) => {
                ErrorCode::InvalidArgument
            }
            SessionError::Gateway(GatewayBuildError::Client(_)) => ErrorCode::Internal,
        }
    }
}

pub struct Session {
    config: ClientConfig,
    store: GraphStore,
    controller: QueryController,
    selection: SelectionHandler,
}

impl Session {
    /// Loads `config/` plus `KGVIEW__*` overrides and talks to the backend over HTTP.
    pub fn from_env() -> Result<Self, SessionError> {
        let config = ClientConfig::load()?;
        Self::connect(config)
    }

    pub fn connect(config: ClientConfig) -> Result<Self, SessionError> {
        let gateway = HttpGateway::new(&config.gateway)?;
        info!(api_base = %gateway.base_url(), "session connected");
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    pub fn with_gateway(config: ClientConfig, gateway: Arc<dyn Gateway>) -> Self {
        let controller = QueryController::new(gateway, config.gateway.api_base.clone());
        let selection = SelectionHandler::new(config.surface.clone());
        Self {
            config,
            store: GraphStore::new(),
            controller,
            selection,
        }
    }

    /// Issues the opening requests: the whole graph and the paper catalog.
    pub fn start(&mut self) -> (Ticket, Ticket) {
        (
            self.controller.load_full_graph(),
            self.controller.refresh_catalog(),
        )
    }

    pub fn load_full_graph(&mut self) -> Ticket {
        self.controller.load_full_graph()
    }

    pub fn search(&mut self, request: SearchRequest) -> Result<Ticket, QueryError> {
        self.controller.search(request)
    }

    pub fn view_paper(&mut self, paper_id: &str) -> Result<Ticket, QueryError> {
        self.controller.view_paper(paper_id)
    }

    pub fn upload(&mut self, upload: DocumentUpload) -> Result<Ticket, QueryError> {
        self.controller.upload(upload)
    }

    pub fn refresh_catalog(&mut self) -> Ticket {
        self.controller.refresh_catalog()
    }

    pub fn tap_node(&mut self, node_id: &str) -> Result<TapOutcome, StoreError> {
        self.selection
            .tap(&mut self.store, &mut self.controller, node_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.store);
    }

    pub fn set_viewport_width(&mut self, width_px: u32) -> SurfacePolicy {
        self.selection.set_viewport_width(width_px)
    }

    pub fn surface_policy(&self) -> SurfacePolicy {
        self.selection.policy()
    }

    pub async fn next_settlement(&mut self) -> Option<Settlement> {
        self.controller.next_settlement(&mut self.store).await
    }

    pub fn settle_ready(&mut self) -> Vec<Settlement> {
        self.controller.settle_ready(&mut self.store)
    }

    /// Applies completions until no slot is pending.
    pub async fn settle_pending(&mut self) -> Vec<Settlement> {
        let mut settlements = Vec::new();
        while self.controller.is_loading() {
            match self.next_settlement().await {
                Some(settlement) => settlements.push(settlement),
                None => break,
            }
        }
        settlements
    }

    pub fn current(&self) -> GraphView<'_> {
        self.store.current()
    }

    pub fn projection(&self) -> Projection {
        render::project(self.store.current())
    }

    /// Ticks on every visible change of the store.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    pub fn catalog(&self) -> &[Paper] {
        self.controller.catalog()
    }

    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.controller.last_error()
    }

    pub fn dismiss_error(&mut self) {
        self.controller.clear_error();
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn phase(&self, slot: Slot) -> SlotPhase {
        self.controller.phase(slot)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
