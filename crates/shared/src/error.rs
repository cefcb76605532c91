use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

/// Failure reported by the backend for a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            message: message.into(),
        }
    }

    /// Builds the error from a raw response body, falling back to
    /// `fallback` when the body carries no usable `detail`.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail.message())
            .unwrap_or_else(|| fallback.to_string());
        Self::new(status, message)
    }
}

/// `{"detail": ...}` envelope used by the backend for errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ErrorDetail {
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorDetail::Message(text) if !text.trim().is_empty() => Some(text.clone()),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Validation(issues) if issues.is_empty() => None,
            ErrorDetail::Validation(issues) => Some(
                issues
                    .iter()
                    .map(|issue| issue.msg.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}
