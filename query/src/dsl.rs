use gateway::UploadError;
use kgview_core::error::{ErrorCode, KgError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Matching papers plus the graph around them.
    #[default]
    Papers,
    /// Matching entities only; no graph.
    Entities,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub mode: SearchMode,
}

/// Rejected user input. Nothing is issued when one of these comes back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("paper id must not be empty")]
    EmptyPaperId,
    #[error("unsupported upload: {0}")]
    UnsupportedUpload(#[from] UploadError),
}

impl KgError for QueryError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    pub fn papers(query: impl Into<String>) -> Self {
        Self::new(query, SearchMode::Papers)
    }

    pub fn entities(query: impl Into<String>) -> Self {
        Self::new(query, SearchMode::Entities)
    }

    /// The query as it is sent to the backend.
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.trimmed_query().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(())
    }
}

pub fn validate_paper_id(paper_id: &str) -> Result<&str, QueryError> {
    let paper_id = paper_id.trim();
    if paper_id.is_empty() {
        return Err(QueryError::EmptyPaperId);
    }
    Ok(paper_id)
}
