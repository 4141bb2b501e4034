//! Error types used throughout the client

use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Boxed source error kept for diagnostics.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Category of a [`TaskLinkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection-level failure before any response was received. Retryable.
    Network,
    /// The attempt was aborted by the configured timeout.
    Timeout,
    /// The attempt was aborted by the caller's cancellation token.
    Cancelled,
    /// A response arrived with a status outside `[200, 300)`.
    Http,
    /// A batch command reported an error.
    Batch,
    /// The requested entities were not returned.
    NotFound,
    /// A precondition was violated before any network activity.
    InvalidInput,
    /// A successful body did not match the expected shape.
    Decode,
    /// Client configuration is missing or invalid.
    Config,
    /// Unexpected internal condition.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Http => "http",
            Self::Batch => "batch",
            Self::NotFound => "not found",
            Self::InvalidInput => "invalid input",
            Self::Decode => "decode",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// The single error shape surfaced to callers.
///
/// Built by the infra crate's classifier from either a transport failure or a
/// non-2xx response, and by the batch protocol for command-level failures.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskLinkError {
    message: String,
    kind: ErrorKind,
    http_status_code: Option<u16>,
    response_data: Option<Value>,
    #[source]
    source: Option<BoxError>,
}

impl TaskLinkError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            http_status_code: None,
            response_data: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach the HTTP status of the response that caused this error.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status_code = Some(status);
        self
    }

    /// Attach the decoded response payload.
    #[must_use]
    pub fn with_response_data(mut self, data: Value) -> Self {
        self.response_data = Some(data);
        self
    }

    /// Preserve the underlying failure.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn http_status_code(&self) -> Option<u16> {
        self.http_status_code
    }

    pub fn response_data(&self) -> Option<&Value> {
        self.response_data.as_ref()
    }

    /// True for 401 and 403 responses.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.http_status_code, Some(401 | 403))
    }

    /// True when the failure happened before any response was received.
    pub fn is_network_error(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    /// Only network-transient failures are retried automatically.
    pub fn is_retryable(&self) -> bool {
        self.is_network_error()
    }
}

/// Result type alias for TaskLink operations
pub type Result<T> = std::result::Result<T, TaskLinkError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_predicate_covers_401_and_403_only() {
        for (status, expected) in [(401, true), (403, true), (404, false), (500, false)] {
            let err = TaskLinkError::new(ErrorKind::Http, "rejected").with_status(status);
            assert_eq!(err.is_auth_error(), expected, "status {status}");
        }
        assert!(!TaskLinkError::network("down").is_auth_error());
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(TaskLinkError::network("refused").is_retryable());
        assert!(!TaskLinkError::new(ErrorKind::Timeout, "slow").is_retryable());
        assert!(!TaskLinkError::new(ErrorKind::Http, "500").with_status(500).is_retryable());
    }

    #[test]
    fn keeps_payload_and_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TaskLinkError::network("connection failed")
            .with_response_data(json!({"error": "x"}))
            .with_source(io);

        assert_eq!(err.to_string(), "connection failed");
        assert_eq!(err.response_data(), Some(&json!({"error": "x"})));
        assert!(StdError::source(&err).is_some());
    }
}
