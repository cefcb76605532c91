use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Every failure the client can surface. The UI treats all of them as
/// "request failed" and shows the display text.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed ({}): {}", .0.status, .0.message)]
    Api(#[from] ApiError),
    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
    #[error("no Telegram init data available")]
    NoInitData,
    #[error("{0}")]
    Validation(String),
    #[error("session storage error: {0}")]
    Storage(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(err) => Some(err.status),
            ClientError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// The session token was rejected and the user has to sign in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::NoInitData)
            || matches!(self, ClientError::Api(err) if err.code == ErrorCode::Unauthorized)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
