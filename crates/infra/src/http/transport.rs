//! Transport boundary and the default reqwest-backed implementation.
//!
//! A transport performs exactly one HTTP exchange. Error statuses are returned
//! as ordinary [`TransportResponse`] values; only failures that prevent a
//! response from being produced surface as [`TransportError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, StatusCode, Url};
use tasklink_domain::{BoxError, TaskLinkError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One outbound exchange, fully shaped by the executor.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL, query included.
    pub url: Url,
    /// Complete header set.
    pub headers: HeaderMap,
    /// Serialized JSON body, if any.
    pub body: Option<String>,
    /// Hint only; the executor enforces its own timer as well.
    pub timeout: Option<Duration>,
    /// Fires when the attempt is abandoned (timeout or caller cancellation).
    pub cancellation: CancellationToken,
}

/// A buffered response, successful or not.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status as received.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body text.
    pub body: String,
}

impl TransportResponse {
    /// Response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    /// True for statuses in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase, empty when unknown.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

/// Failures that happen before any response exists.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS failure, refused connection, reset while sending or reading.
    #[error("{message}")]
    Network {
        /// Human-readable description.
        message: String,
        /// Underlying client error.
        #[source]
        source: Option<BoxError>,
    },

    /// The attempt exceeded its timeout.
    #[error("request timed out after {0:?}")]
    TimedOut(Option<Duration>),

    /// The attempt's cancellation token fired.
    #[error("request aborted")]
    Aborted,

    /// The request could not be built (bad header, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Network failure without an underlying source.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), source: None }
    }
}

/// Pluggable HTTP exchange.
///
/// Implementations must return non-2xx responses as `Ok` so the executor can
/// classify them uniformly.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange, buffering the whole body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TaskLinkError> {
        Self::builder().build()
    }

    /// Wrap an existing client (shares its connection pool).
    pub fn from_client(client: ReqwestClient) -> Self {
        Self { client }
    }

    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(request.method, request.url).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(TransportResponse { status, headers, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let cancellation = request.cancellation.clone();
        debug!(method = %request.method, url = %request.url, "dispatching via reqwest");

        tokio::select! {
            biased;
            () = cancellation.cancelled() => Err(TransportError::Aborted),
            result = self.exchange(request) => result,
        }
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    connect_timeout: Option<Duration>,
}

impl ReqwestTransportBuilder {
    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers added to every request unless the request sets them.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Limit on establishing the connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the underlying client cannot be built.
    pub fn build(self) -> Result<ReqwestTransport, TaskLinkError> {
        let mut builder = ReqwestClient::builder();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder.build().map_err(|err| {
            TaskLinkError::config(format!("failed to build HTTP transport: {err}")).with_source(err)
        })?;

        Ok(ReqwestTransport { client })
    }
}
