use crate::api::{
    error_detail, DocumentUpload, EntitiesResponse, GraphResponse, PapersResponse,
    ProcessTextRequest, UploadResponse,
};
use crate::error::{GatewayBuildError, GatewayError, GatewayErrorKind, Operation};
use async_trait::async_trait;
use kgview_core::config::GatewayConfig;
use kgview_core::metrics::{CallOutcome, GatewayMetrics};
use kgview_core::model::{Entity, GraphPayload, Paper};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Typed access to the knowledge-graph backend. Implementations never panic
/// and never retry; every failure comes back as a [`GatewayError`].
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_full_graph(&self) -> Result<GraphPayload, GatewayError>;
    async fn fetch_node_expansion(&self, node_id: &str) -> Result<GraphPayload, GatewayError>;
    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>, GatewayError>;
    async fn search_graph(&self, query: &str) -> Result<GraphPayload, GatewayError>;
    async fn search_entities(&self, query: &str) -> Result<Vec<Entity>, GatewayError>;
    async fn fetch_paper_graph(&self, paper_id: &str) -> Result<GraphPayload, GatewayError>;
    async fn list_papers(&self) -> Result<Vec<Paper>, GatewayError>;
    /// Returns the text the backend extracted from the document.
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError>;
    async fn process_text(&self, text: &str) -> Result<GraphPayload, GatewayError>;
}

pub struct HttpGateway {
    client: Client,
    base: Url,
    config: GatewayConfig,
    metrics: GatewayMetrics,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayBuildError> {
        Self::with_metrics(config, GatewayMetrics::default())
    }

    pub fn with_metrics(
        config: &GatewayConfig,
        metrics: GatewayMetrics,
    ) -> Result<Self, GatewayBuildError> {
        let base = parse_base_url(&config.api_base)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base,
            config: config.clone(),
            metrics,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn limit_param(&self, limit: Option<u32>) -> Vec<(&'static str, String)> {
        limit
            .map(|limit| vec![("limit", limit.to_string())])
            .unwrap_or_default()
    }

    async fn get_graph(
        &self,
        operation: Operation,
        url: Url,
        query: Vec<(&'static str, String)>,
    ) -> Result<GraphPayload, GatewayError> {
        let response: GraphResponse = self
            .execute(operation, self.client.get(url).query(&query))
            .await?;
        Ok(response.into_payload())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let started = Instant::now();
        let result = self.send(operation, request).await;

        let outcome = match &result {
            Ok(_) => CallOutcome::Succeeded,
            Err(err) if err.kind == GatewayErrorKind::Timeout => CallOutcome::TimedOut,
            Err(_) => CallOutcome::Failed,
        };
        self.metrics
            .record_call(started.elapsed().as_micros() as u64, outcome);

        if let Err(err) = &result {
            warn!(operation = %operation, error = %err, "backend call failed");
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        debug!(operation = %operation, "sending backend request");
        let response = request
            .send()
            .await
            .map_err(|err| transport_error(operation, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::http_status(
                operation,
                status.as_u16(),
                error_detail(&body),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(operation, &err))?;
        serde_json::from_slice(&body)
            .map_err(|err| GatewayError::malformed(operation, err.to_string()))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_full_graph(&self) -> Result<GraphPayload, GatewayError> {
        let url = self.endpoint(&["graph"]);
        let query = self.limit_param(self.config.graph_limit);
        self.get_graph(Operation::FetchFullGraph, url, query).await
    }

    async fn fetch_node_expansion(&self, node_id: &str) -> Result<GraphPayload, GatewayError> {
        let url = self.endpoint(&["graph", node_id, "expand"]);
        let query = self
            .config
            .expand_depth
            .map(|depth| vec![("depth", depth.to_string())])
            .unwrap_or_default();
        self.get_graph(Operation::FetchNodeExpansion, url, query).await
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>, GatewayError> {
        let url = self.endpoint(&["papers", "search"]);
        let mut params = vec![("q", query.to_string())];
        params.extend(self.limit_param(self.config.search_limit));
        let response: PapersResponse = self
            .execute(Operation::SearchPapers, self.client.get(url).query(&params))
            .await?;
        Ok(response.into_papers())
    }

    async fn search_graph(&self, query: &str) -> Result<GraphPayload, GatewayError> {
        let url = self.endpoint(&["graph", "search"]);
        let mut params = vec![("q", query.to_string())];
        params.extend(self.limit_param(self.config.graph_limit));
        self.get_graph(Operation::SearchGraph, url, params).await
    }

    async fn search_entities(&self, query: &str) -> Result<Vec<Entity>, GatewayError> {
        let url = self.endpoint(&["entities", "search"]);
        let mut params = vec![("q", query.to_string())];
        params.extend(self.limit_param(self.config.search_limit));
        let response: EntitiesResponse = self
            .execute(Operation::SearchEntities, self.client.get(url).query(&params))
            .await?;
        response
            .into_entities()
            .map_err(|detail| GatewayError::malformed(Operation::SearchEntities, detail))
    }

    async fn fetch_paper_graph(&self, paper_id: &str) -> Result<GraphPayload, GatewayError> {
        let url = self.endpoint(&["papers", paper_id, "graph"]);
        self.get_graph(Operation::FetchPaperGraph, url, Vec::new())
            .await
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, GatewayError> {
        let url = self.endpoint(&["papers"]);
        let response: PapersResponse = self
            .execute(Operation::ListPapers, self.client.get(url))
            .await?;
        Ok(response.into_papers())
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError> {
        let operation = Operation::UploadDocument;
        let part = Part::bytes(upload.content.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)
            .map_err(|err| GatewayError::malformed(operation, err.to_string()))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["upload-pdf"]);
        let response: UploadResponse = self
            .execute(operation, self.client.post(url).multipart(form))
            .await?;
        Ok(response.into_text())
    }

    async fn process_text(&self, text: &str) -> Result<GraphPayload, GatewayError> {
        let operation = Operation::ProcessText;
        let url = self.endpoint(&["process-text"]);
        let response: GraphResponse = self
            .execute(
                operation,
                self.client.post(url).json(&ProcessTextRequest { text }),
            )
            .await?;
        Ok(response.into_payload())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, GatewayBuildError> {
    let invalid = |reason: String| GatewayBuildError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot carry a path".to_string()));
    }
    Ok(url)
}

fn transport_error(operation: Operation, err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::timeout(operation, err.to_string())
    } else if err.is_decode() {
        GatewayError::malformed(operation, err.to_string())
    } else {
        GatewayError::unreachable(operation, err.to_string())
    }
}
