//! Errors raised at the backend boundary.

use thiserror::Error;

/// Failure of a single backend request.
///
/// Carries strings rather than source errors so it can travel inside
/// `WorkerEvent`, which is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure: connection refused, timeout, broken body.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response, with the server's `error` text when it sent one.
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    /// Body did not match the expected JSON shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The selected file could not be read from disk.
    #[error("{0}")]
    Io(String),
}

impl ApiError {
    /// Server-provided message for application errors.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
