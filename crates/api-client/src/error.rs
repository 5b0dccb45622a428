//! Error types for the pipeline API client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Terminal 4xx answer; the body usually names the offending field
    #[error("request failed: {status} - {body}")]
    Request { status: u16, body: String },

    #[error("server error: {status}")]
    Server { status: u16 },

    /// Non-success answer on an operation that does not classify statuses
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Whether another attempt may succeed
    ///
    /// Server errors and transport failures are transient; 4xx answers and
    /// malformed bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Server { .. } | ApiError::Transport(_) => true,
            ApiError::Operation { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. }
            | ApiError::Server { status }
            | ApiError::Status { status } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Operation { source, .. } => source.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_terminal() {
        let err = ApiError::Request {
            status: 400,
            body: "bad field".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "request failed: 400 - bad field");
    }

    #[test]
    fn test_operation_wrapper_keeps_cause() {
        let err = ApiError::Operation {
            operation: "synopsis analysis",
            source: Box::new(ApiError::Server { status: 503 }),
        };
        assert_eq!(err.to_string(), "synopsis analysis failed: server error: 503");
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));
    }
}
