//! Network error types.

use std::sync::Arc;

/// Errors from the network capability.
///
/// An HTTP error status is not a network error: any response that arrives
/// is handed to the caller as-is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Transport(Arc<reqwest::Error>),

    /// The request could not be built (bad method or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be read.
    #[error("failed to read response: {0}")]
    Body(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Transport(Arc::new(err))
        }
    }
}
