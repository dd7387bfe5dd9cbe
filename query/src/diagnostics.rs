use crate::slot::Slot;
use gateway::{GatewayError, GatewayErrorKind, Operation};
use kgview_core::error::{ErrorCode, KgError};
use std::fmt;
use storage::StoreError;

/// A failure worded for the user, tied to the slot that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub slot: Slot,
    pub code: ErrorCode,
    pub message: String,
}

impl Diagnostic {
    pub fn from_gateway(slot: Slot, err: &GatewayError, api_base: &str) -> Self {
        let message = match err.kind {
            GatewayErrorKind::Unreachable => format!(
                "Cannot reach the backend at {}. Please verify the backend is running.",
                api_base
            ),
            GatewayErrorKind::Timeout => format!(
                "{} timed out. Please try again.",
                describe(err.operation)
            ),
            _ if err.detail.trim().is_empty() => {
                format!("{} failed. Please try again.", describe(err.operation))
            }
            _ => format!(
                "{} failed: {}. Please try again.",
                describe(err.operation),
                err.detail.trim_end_matches('.')
            ),
        };
        Self {
            slot,
            code: err.error_code(),
            message,
        }
    }

    /// The request task ended without producing an answer.
    pub fn aborted(slot: Slot) -> Self {
        Self {
            slot,
            code: ErrorCode::Internal,
            message: format!("{} stopped unexpectedly. Please try again.", describe_slot(slot)),
        }
    }

    pub fn from_store(slot: Slot, err: &StoreError) -> Self {
        Self {
            slot,
            code: err.error_code(),
            message: format!("The backend returned an inconsistent graph ({}).", err),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

fn describe(operation: Operation) -> &'static str {
    match operation {
        Operation::FetchFullGraph => "Loading the graph",
        Operation::FetchNodeExpansion => "Expanding the node",
        Operation::SearchPapers => "Searching papers",
        Operation::SearchGraph => "Searching the graph",
        Operation::SearchEntities => "Searching entities",
        Operation::FetchPaperGraph => "Loading the paper graph",
        Operation::ListPapers => "Loading the paper list",
        Operation::UploadDocument => "Uploading the document",
        Operation::ProcessText => "Processing the document text",
    }
}

fn describe_slot(slot: Slot) -> &'static str {
    match slot {
        Slot::FullGraph => "Loading the graph",
        Slot::Search => "The search",
        Slot::PaperGraph => "Loading the paper graph",
        Slot::Upload => "The document upload",
        Slot::PaperList => "Loading the paper list",
        Slot::Expansion => "Expanding the node",
    }
}
