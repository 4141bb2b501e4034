//! Conversions from external infrastructure errors into transport and domain
//! errors.

use reqwest::Error as HttpError;
use tasklink_domain::{ErrorKind, TaskLinkError};

use crate::http::transport::TransportError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        if err.is_timeout() {
            return Self::TimedOut(None);
        }

        if err.is_builder() {
            return Self::InvalidRequest(err.to_string());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if err.is_connect() {
            return Self::Network {
                message: "HTTP connection failure".into(),
                source: Some(Box::new(err)),
            };
        }

        Self::Network { message: format!("HTTP transport failure: {err}"), source: Some(Box::new(err)) }
    }
}

/* -------------------------------------------------------------------------- */
/* Other library errors → TaskLinkError */
/* -------------------------------------------------------------------------- */

pub(crate) fn url_error(base: &str, path: &str, err: url::ParseError) -> TaskLinkError {
    TaskLinkError::invalid_input(format!("invalid request URL '{base}' + '{path}': {err}"))
        .with_source(err)
}

pub(crate) fn serialize_error(err: serde_json::Error) -> TaskLinkError {
    TaskLinkError::invalid_input(format!("failed to serialize request payload: {err}"))
        .with_source(err)
}

pub(crate) fn decode_error(err: serde_json::Error) -> TaskLinkError {
    TaskLinkError::new(ErrorKind::Decode, format!("unexpected response shape: {err}"))
        .with_source(err)
}
