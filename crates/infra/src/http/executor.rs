//! Request executor: one logical call, retried and time-boxed.
//!
//! Shapes headers and payload from a [`RequestDescriptor`], sends it through
//! an [`HttpTransport`], retries network-transient failures according to a
//! [`RetryPolicy`], and returns the decoded body converted to object-format
//! casing. HTTP error statuses are never retried.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tasklink_domain::{ErrorKind, Result, TaskLinkError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::query::encode_query;
use super::retry::RetryPolicy;
use super::transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};
use crate::casing::{to_object_format, to_wire_format};
use crate::errors::{
    classify_response, classify_transport_error, decode_body, decode_error, serialize_error,
    url_error,
};

/// Header carrying the client-supplied idempotency token.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Immutable description of one call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    base_url: String,
    path: String,
    api_token: Option<String>,
    payload: Option<Map<String, Value>>,
    request_id: Option<String>,
    has_sync_commands: bool,
    extra_headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Describe a call to `path`, resolved against `base_url`.
    pub fn new(method: Method, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            path: path.into(),
            api_token: None,
            payload: None,
            request_id: None,
            has_sync_commands: false,
            extra_headers: Vec::new(),
        }
    }

    /// Bearer credential; no `Authorization` header is sent when `None`.
    #[must_use]
    pub fn api_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.api_token = token.map(Into::into);
        self
    }

    /// Key-value payload in object format.
    #[must_use]
    pub fn payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serialize `payload` into the descriptor. It must serialize to an object.
    pub fn json_payload<T: Serialize>(self, payload: &T) -> Result<Self> {
        match serde_json::to_value(payload).map_err(serialize_error)? {
            Value::Object(map) => Ok(self.payload(map)),
            Value::Null => Ok(self),
            other => Err(TaskLinkError::invalid_input(format!(
                "request payload must be a key-value mapping, got {other}"
            ))),
        }
    }

    /// Caller-supplied idempotency token. When `None`, POSTs outside the
    /// exempt base get a generated one.
    #[must_use]
    pub fn request_id(mut self, request_id: Option<impl Into<String>>) -> Self {
        self.request_id = request_id.map(Into::into);
        self
    }

    /// Mark the payload as a batch-command envelope already in wire format.
    #[must_use]
    pub fn sync_commands(mut self, enabled: bool) -> Self {
        self.has_sync_commands = enabled;
        self
    }

    /// Extra header merged after the defaults (may override them).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// HTTP verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Base URL the path is joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Successful outcome of [`RequestExecutor::execute`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Decoded body (JSON when parseable, raw text otherwise) in object format.
    pub data: Value,
    /// Final (2xx) status.
    pub status: StatusCode,
    /// Canonical reason phrase, empty when unknown.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
}

impl HttpResponse {
    /// Deserialize `data` into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data).map_err(decode_error)
    }

    /// Consuming variant of [`Self::json`].
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data).map_err(decode_error)
    }
}

/// Executes requests with retry, timeout and cancellation.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    timeout: Option<Duration>,
    idempotency_exempt_base: Option<String>,
}

impl RequestExecutor {
    /// Start building a new executor.
    pub fn builder() -> RequestExecutorBuilder {
        RequestExecutorBuilder::default()
    }

    /// Retry policy fixed at construction.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `descriptor` without a caller cancellation token.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse> {
        self.execute_with_cancellation(descriptor, None).await
    }

    /// Execute `descriptor`; `cancel` aborts the in-flight attempt and any
    /// pending back-off.
    #[instrument(skip_all, fields(method = %descriptor.method, path = %descriptor.path))]
    pub async fn execute_with_cancellation(
        &self,
        descriptor: &RequestDescriptor,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse> {
        let headers = self.build_headers(descriptor)?;
        let (url, body) = shape_payload(descriptor)?;
        let max_attempts = self.policy.max_attempts();

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, url = %url, "sending request");

            let request = TransportRequest {
                method: descriptor.method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
                timeout: self.timeout,
                cancellation: CancellationToken::new(),
            };

            let err = match self.attempt(request, cancel).await {
                Ok(response) => {
                    debug!(attempt, status = %response.status, "request succeeded");
                    return Ok(finish(response));
                }
                Err(err) => err,
            };

            if attempt >= max_attempts || !self.policy.is_retryable(&err) {
                if err.is_network_error() {
                    warn!(attempt, error = %err, "network failure; giving up");
                } else {
                    debug!(attempt, kind = %err.kind(), error = %err, "request failed");
                }
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(attempt, ?delay, error = %err, "network failure; retrying");
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = cancelled(cancel) => return Err(cancelled_error()),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// One transport call raced against the timeout and the caller's token.
    ///
    /// Both sources cancel the attempt's own token so the transport can stop
    /// early; the timer is dropped with the `select!` on every exit path.
    async fn attempt(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<TransportResponse> {
        let controller = request.cancellation.clone();
        let timeout = self.timeout;

        let outcome = tokio::select! {
            biased;
            () = cancelled(cancel) => {
                controller.cancel();
                Err(TransportError::Aborted)
            }
            () = timer(timeout) => {
                controller.cancel();
                Err(TransportError::TimedOut(timeout))
            }
            result = self.transport.send(request) => result,
        };

        let response = outcome.map_err(classify_transport_error)?;
        if !response.is_success() {
            return Err(classify_response(&response));
        }
        Ok(response)
    }

    fn build_headers(&self, descriptor: &RequestDescriptor) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &descriptor.api_token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }

        let request_id = descriptor.request_id.clone().or_else(|| {
            (descriptor.method == Method::POST && !self.is_exempt(&descriptor.base_url))
                .then(|| Uuid::new_v4().to_string())
        });
        if let Some(request_id) = request_id {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value(&request_id)?);
        }

        for (name, value) in &descriptor.extra_headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|err| {
                TaskLinkError::invalid_input(format!("invalid header name '{name}': {err}"))
            })?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }

    fn is_exempt(&self, base_url: &str) -> bool {
        self.idempotency_exempt_base
            .as_deref()
            .is_some_and(|exempt| exempt.trim_end_matches('/') == base_url.trim_end_matches('/'))
    }
}

fn finish(response: TransportResponse) -> HttpResponse {
    HttpResponse {
        data: to_object_format(decode_body(&response.body)),
        status_text: response.status_text().to_string(),
        status: response.status,
        headers: response.headers,
    }
}

fn shape_payload(descriptor: &RequestDescriptor) -> Result<(Url, Option<String>)> {
    let mut url = request_url(&descriptor.base_url, &descriptor.path)?;
    let Some(payload) = &descriptor.payload else {
        return Ok((url, None));
    };

    let body = match descriptor.method {
        Method::GET => {
            if let Value::Object(params) = to_wire_format(Value::Object(payload.clone())) {
                url.set_query(encode_query(&params).as_deref());
            }
            None
        }
        Method::DELETE => None,
        _ if descriptor.has_sync_commands => {
            Some(serde_json::to_string(payload).map_err(serialize_error)?)
        }
        _ => Some(
            serde_json::to_string(&to_wire_format(Value::Object(payload.clone())))
                .map_err(serialize_error)?,
        ),
    };

    Ok((url, body))
}

fn request_url(base_url: &str, path: &str) -> Result<Url> {
    let base = if base_url.ends_with('/') {
        Url::parse(base_url)
    } else {
        Url::parse(&format!("{base_url}/"))
    }
    .map_err(|err| url_error(base_url, path, err))?;

    base.join(path.trim_start_matches('/')).map_err(|err| url_error(base_url, path, err))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| TaskLinkError::invalid_input(format!("invalid header value: {err}")))
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => pending().await,
    }
}

async fn timer(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => pending().await,
    }
}

fn cancelled_error() -> TaskLinkError {
    TaskLinkError::new(ErrorKind::Cancelled, "request was cancelled")
}

/// Builder for [`RequestExecutor`].
#[derive(Default)]
pub struct RequestExecutorBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    policy: RetryPolicy,
    timeout: Option<Duration>,
    idempotency_exempt_base: Option<String>,
}

impl RequestExecutorBuilder {
    /// Substitute the transport (defaults to [`ReqwestTransport`]).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Retry policy (defaults to [`RetryPolicy::DEFAULT`]).
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-attempt timeout; `None` or a zero duration disables the timer.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|duration| !duration.is_zero());
        self
    }

    /// Base URL on which idempotency tokens are never auto-generated.
    pub fn idempotency_exempt_base(mut self, base_url: impl Into<String>) -> Self {
        self.idempotency_exempt_base = Some(base_url.into());
        self
    }

    /// Build the executor.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the default transport cannot be created.
    pub fn build(self) -> Result<RequestExecutor> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(RequestExecutor {
            transport,
            policy: self.policy,
            timeout: self.timeout,
            idempotency_exempt_base: self.idempotency_exempt_base,
        })
    }
}
