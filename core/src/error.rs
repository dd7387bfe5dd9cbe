use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Unavailable,
    DeadlineExceeded,
    MalformedResponse,
    Internal,
}

impl ErrorCode {
    /// Coarse category for a backend HTTP status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 409 | 413 | 415 | 422 => ErrorCode::InvalidArgument,
            404 => ErrorCode::NotFound,
            408 | 504 => ErrorCode::DeadlineExceeded,
            502 | 503 => ErrorCode::Unavailable,
            _ => ErrorCode::Internal,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorCode::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

pub trait KgError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}
