use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tasklink_infra::{
    HttpTransport, RequestExecutor, RetryPolicy, TransportError, TransportRequest,
    TransportResponse,
};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Fail before producing a response (connection refused).
    NetworkFailure,
    /// Return a response with the given status and body.
    Respond(u16, String),
    /// Never complete unless the request's token is cancelled.
    Hang,
}

/// In-memory transport replaying a script, then repeating `fallback`.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Fail `failures` times with a network error, then answer `200 {body}`.
    pub fn flaky(failures: usize, body: &str) -> Arc<Self> {
        Self::new(vec![Step::NetworkFailure; failures], Step::Respond(200, body.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("requests mutex poisoned").push(request.clone());

        let step = self
            .script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::NetworkFailure => Err(TransportError::network("connection refused")),
            Step::Respond(status, body) => Ok(TransportResponse::new(
                StatusCode::from_u16(status).expect("valid status code"),
                body,
            )),
            Step::Hang => {
                request.cancellation.cancelled().await;
                Err(TransportError::Aborted)
            }
        }
    }
}

/// Executor over `transport` with a zero-delay policy of three retries.
pub fn executor_with(transport: Arc<ScriptedTransport>) -> RequestExecutor {
    RequestExecutor::builder()
        .transport(transport)
        .retry_policy(RetryPolicy::immediate(3))
        .build()
        .expect("executor should build")
}
