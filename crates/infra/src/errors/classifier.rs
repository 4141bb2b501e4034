//! Failure classification.
//!
//! Normalizes transport failures and non-2xx responses into
//! [`TaskLinkError`] and decides which of them are worth retrying.

use serde_json::Value;
use tasklink_domain::{ErrorKind, TaskLinkError};

use crate::http::transport::{TransportError, TransportResponse};

/// Retry-relevant classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Nothing was received; the same request may succeed if sent again.
    NetworkTransient,
    /// Deterministic rejection, cancellation, or local error.
    Terminal,
}

/// Classify an already-normalized error.
pub fn failure_class(err: &TaskLinkError) -> FailureClass {
    if err.is_network_error() {
        FailureClass::NetworkTransient
    } else {
        FailureClass::Terminal
    }
}

/// Normalize a failure raised by the transport before any response existed.
///
/// Timeouts and aborts are kept apart from network failures so they are not
/// retried.
pub fn classify_transport_error(err: TransportError) -> TaskLinkError {
    match err {
        TransportError::Network { message, source } => {
            let classified = TaskLinkError::network(message);
            match source {
                Some(source) => classified.with_source(source),
                None => classified,
            }
        }
        err @ TransportError::TimedOut(_) => {
            TaskLinkError::new(ErrorKind::Timeout, err.to_string()).with_source(err)
        }
        TransportError::Aborted => {
            TaskLinkError::new(ErrorKind::Cancelled, "request was cancelled")
                .with_source(TransportError::Aborted)
        }
        TransportError::InvalidRequest(message) => TaskLinkError::invalid_input(message),
    }
}

/// Build the terminal error for a response whose status is outside
/// `[200, 300)`.
pub fn classify_response(response: &TransportResponse) -> TaskLinkError {
    let status = response.status.as_u16();
    let status_text = response.status_text();
    let message = if status_text.is_empty() {
        format!("request failed with status code {status}")
    } else {
        format!("request failed with status code {status} ({status_text})")
    };

    TaskLinkError::new(ErrorKind::Http, message)
        .with_status(status)
        .with_response_data(decode_body(&response.body))
}

/// JSON when it parses, raw text otherwise; never fails.
///
/// An empty body decodes to `null`.
pub fn decode_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
