//! Caller-facing task client
//!
//! Thin per-entity methods over the shared [`RequestExecutor`]. Single-entity
//! calls go straight to the REST origin; multi-entity moves go through the
//! batch protocol on the sync origin.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tasklink_domain::{
    AddTaskArgs, ClientConfig, MoveTarget, Result, Task, TaskFilter, TaskLinkError,
    UpdateTaskArgs,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::http::{
    HttpTransport, ReqwestTransport, RequestDescriptor, RequestExecutor, RetryPolicy,
};
use crate::sync::SyncBatchClient;

const TASKS_PATH: &str = "tasks";

/// Client for the task service.
pub struct TaskClient {
    executor: Arc<RequestExecutor>,
    config: ClientConfig,
    batch: SyncBatchClient,
}

impl TaskClient {
    /// Create a client using the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> TaskClientBuilder {
        TaskClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch one task by id.
    #[instrument(skip(self))]
    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let id = require_id(id)?;
        let descriptor = self.rest(Method::GET, format!("{TASKS_PATH}/{id}"));
        self.executor.execute(&descriptor).await?.into_json()
    }

    /// List tasks matching `filter`.
    #[instrument(skip(self, filter))]
    pub async fn get_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let descriptor = self.rest(Method::GET, TASKS_PATH).json_payload(filter)?;
        let tasks: Vec<Task> = self.executor.execute(&descriptor).await?.into_json()?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    /// Create a task.
    #[instrument(skip(self, args, request_id))]
    pub async fn add_task(&self, args: &AddTaskArgs, request_id: Option<String>) -> Result<Task> {
        let descriptor =
            self.rest(Method::POST, TASKS_PATH).request_id(request_id).json_payload(args)?;
        self.executor.execute(&descriptor).await?.into_json()
    }

    /// Update a task's fields.
    #[instrument(skip(self, args, request_id))]
    pub async fn update_task(
        &self,
        id: &str,
        args: &UpdateTaskArgs,
        request_id: Option<String>,
    ) -> Result<Task> {
        let id = require_id(id)?;
        let descriptor = self
            .rest(Method::POST, format!("{TASKS_PATH}/{id}"))
            .request_id(request_id)
            .json_payload(args)?;
        self.executor.execute(&descriptor).await?.into_json()
    }

    /// Mark a task as completed.
    #[instrument(skip(self, request_id))]
    pub async fn close_task(&self, id: &str, request_id: Option<String>) -> Result<bool> {
        let id = require_id(id)?;
        let descriptor =
            self.rest(Method::POST, format!("{TASKS_PATH}/{id}/close")).request_id(request_id);
        let response = self.executor.execute(&descriptor).await?;
        Ok(response.status.is_success())
    }

    /// Delete a task.
    #[instrument(skip(self, request_id))]
    pub async fn delete_task(&self, id: &str, request_id: Option<String>) -> Result<bool> {
        let id = require_id(id)?;
        let descriptor =
            self.rest(Method::DELETE, format!("{TASKS_PATH}/{id}")).request_id(request_id);
        let response = self.executor.execute(&descriptor).await?;
        Ok(response.status.is_success())
    }

    /// Like [`Self::get_task`] but abortable through `cancel`.
    #[instrument(skip(self, cancel))]
    pub async fn get_task_cancellable(&self, id: &str, cancel: &CancellationToken) -> Result<Task> {
        let id = require_id(id)?;
        let descriptor = self.rest(Method::GET, format!("{TASKS_PATH}/{id}"));
        self.executor.execute_with_cancellation(&descriptor, Some(cancel)).await?.into_json()
    }

    /// Move up to 100 tasks to a project, section or parent in one request.
    pub async fn move_tasks<S: AsRef<str> + Sync>(
        &self,
        ids: &[S],
        target: &MoveTarget,
        request_id: Option<String>,
    ) -> Result<Vec<Task>> {
        self.batch.move_many(ids, target, request_id).await
    }

    fn rest(&self, method: Method, path: impl Into<String>) -> RequestDescriptor {
        RequestDescriptor::new(method, &self.config.rest_base_url, path)
            .api_token(self.config.api_token.clone())
    }
}

/// Ids are interpolated into the request path, so they must form exactly one
/// segment below `tasks/`.
fn require_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(TaskLinkError::invalid_input("task id must not be empty"));
    }
    if matches!(trimmed, "." | "..")
        || trimmed.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#') || c.is_control())
    {
        return Err(TaskLinkError::invalid_input(format!("invalid task id '{trimmed}'")));
    }
    Ok(trimmed)
}

/// Builder for [`TaskClient`]
#[derive(Default)]
pub struct TaskClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    policy: Option<RetryPolicy>,
}

impl TaskClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Substitute the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the retry policy derived from the configuration
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the default transport cannot be created
    pub fn build(self) -> Result<TaskClient> {
        let config = self.config.unwrap_or_default();

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = ReqwestTransport::builder();
                if let Some(agent) = &config.user_agent {
                    builder = builder.user_agent(agent.clone());
                }
                Arc::new(builder.build()?)
            }
        };

        let executor = RequestExecutor::builder()
            .transport(transport)
            .retry_policy(self.policy.unwrap_or_else(|| RetryPolicy::from(config.retry)))
            .timeout(config.timeout_ms.map(Duration::from_millis))
            .idempotency_exempt_base(config.rest_base_url.clone())
            .build()?;
        let executor = Arc::new(executor);

        let batch = SyncBatchClient::new(
            Arc::clone(&executor),
            config.sync_base_url.clone(),
            config.api_token.clone(),
        );

        Ok(TaskClient { executor, config, batch })
    }
}
