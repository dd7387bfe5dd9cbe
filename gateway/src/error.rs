use kgview_core::error::{ErrorCode, KgError};
use std::fmt;
use thiserror::Error;

/// Backend capabilities, one per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchFullGraph,
    FetchNodeExpansion,
    SearchPapers,
    SearchGraph,
    SearchEntities,
    FetchPaperGraph,
    ListPapers,
    UploadDocument,
    ProcessText,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchFullGraph => "fetch_full_graph",
            Operation::FetchNodeExpansion => "fetch_node_expansion",
            Operation::SearchPapers => "search_papers",
            Operation::SearchGraph => "search_graph",
            Operation::SearchEntities => "search_entities",
            Operation::FetchPaperGraph => "fetch_paper_graph",
            Operation::ListPapers => "list_papers",
            Operation::UploadDocument => "upload_document",
            Operation::ProcessText => "process_text",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The backend could not be reached at all.
    Unreachable,
    /// The backend answered with a non-success status.
    HttpStatus(u16),
    Timeout,
    /// The response did not decode into the expected record.
    Malformed,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayErrorKind::Unreachable => f.write_str("unreachable"),
            GatewayErrorKind::HttpStatus(code) => write!(f, "http status {}", code),
            GatewayErrorKind::Timeout => f.write_str("timeout"),
            GatewayErrorKind::Malformed => f.write_str("malformed response"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed ({kind}): {detail}")]
pub struct GatewayError {
    pub operation: Operation,
    pub kind: GatewayErrorKind,
    pub detail: String,
}

impl GatewayError {
    pub fn new(operation: Operation, kind: GatewayErrorKind, detail: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            detail: detail.into(),
        }
    }

    pub fn unreachable(operation: Operation, detail: impl Into<String>) -> Self {
        Self::new(operation, GatewayErrorKind::Unreachable, detail)
    }

    pub fn http_status(operation: Operation, status: u16, detail: impl Into<String>) -> Self {
        Self::new(operation, GatewayErrorKind::HttpStatus(status), detail)
    }

    pub fn timeout(operation: Operation, detail: impl Into<String>) -> Self {
        Self::new(operation, GatewayErrorKind::Timeout, detail)
    }

    pub fn malformed(operation: Operation, detail: impl Into<String>) -> Self {
        Self::new(operation, GatewayErrorKind::Malformed, detail)
    }
}

impl KgError for GatewayError {
    fn error_code(&self) -> ErrorCode {
        match self.kind {
            GatewayErrorKind::Unreachable => ErrorCode::Unavailable,
            GatewayErrorKind::HttpStatus(status) => ErrorCode::from_http_status(status),
            GatewayErrorKind::Timeout => ErrorCode::DeadlineExceeded,
            GatewayErrorKind::Malformed => ErrorCode::MalformedResponse,
        }
    }
}

/// Problems building an [`HttpGateway`](crate::HttpGateway) from configuration.
#[derive(Error, Debug)]
pub enum GatewayBuildError {
    #[error("invalid api base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}
