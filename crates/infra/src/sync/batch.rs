//! Batch ("sync") mutation protocol.
//!
//! Builds one command per entity, submits them in a single request and
//! reconciles the per-command status map. Any failed command fails the whole
//! call; the service's atomicity for these batches is not assumed.

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Map, Value};
use tasklink_domain::{
    BatchCommand, BatchEnvelope, BatchResult, CommandError, CommandStatus, CommandType, ErrorKind,
    MoveTarget, Result, Task, TaskLinkError, MAX_BATCH_COMMANDS,
};
use tracing::{debug, info, instrument, warn};

use crate::http::{RequestDescriptor, RequestExecutor};

/// Path of the batch endpoint relative to the sync base URL.
pub const SYNC_PATH: &str = "sync";

/// Resource types requested back with every move batch.
const MOVE_RESOURCE_TYPES: &[&str] = &["items"];

/// Submits batch commands through a shared [`RequestExecutor`].
#[derive(Clone)]
pub struct SyncBatchClient {
    executor: Arc<RequestExecutor>,
    base_url: String,
    api_token: Option<String>,
}

impl SyncBatchClient {
    /// Client posting to `{base_url}sync` with the given bearer credential.
    pub fn new(
        executor: Arc<RequestExecutor>,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self { executor, base_url: base_url.into(), api_token }
    }

    /// Move up to [`MAX_BATCH_COMMANDS`] entities to `target` in one round
    /// trip, returning the moved entities that were asked for.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when more than 100 ids are given (nothing is sent)
    /// - `Batch` with the first failing command's details
    /// - `NotFound` when the service returns no entities
    /// - any executor error
    #[instrument(
        skip(self, ids, target, request_id),
        fields(count = ids.len(), destination = ?target)
    )]
    pub async fn move_many<S: AsRef<str>>(
        &self,
        ids: &[S],
        target: &MoveTarget,
        request_id: Option<String>,
    ) -> Result<Vec<Task>> {
        if ids.len() > MAX_BATCH_COMMANDS {
            return Err(TaskLinkError::invalid_input(format!(
                "maximum number of items is {MAX_BATCH_COMMANDS}, got {}",
                ids.len()
            )));
        }

        let commands = build_move_commands(ids, target);
        let envelope = BatchEnvelope {
            commands,
            resource_types: MOVE_RESOURCE_TYPES.iter().map(|s| (*s).to_string()).collect(),
        };

        let descriptor = RequestDescriptor::new(Method::POST, &self.base_url, SYNC_PATH)
            .api_token(self.api_token.clone())
            .request_id(request_id)
            .sync_commands(true)
            .json_payload(&envelope)?;

        debug!(commands = envelope.commands.len(), "submitting move batch");
        let response = self.executor.execute(&descriptor).await?;
        let result: BatchResult = response.into_json()?;

        let moved = reconcile(&envelope.commands, result, ids)?;
        info!(moved = moved.len(), "move batch applied");
        Ok(moved)
    }
}

/// One `item_move` command per id, each with its own operation id.
pub fn build_move_commands<S: AsRef<str>>(ids: &[S], target: &MoveTarget) -> Vec<BatchCommand> {
    let (target_key, target_id) = target.wire_arg();

    ids.iter()
        .map(|id| {
            let mut args = Map::new();
            args.insert("id".to_string(), Value::String(AsRef::<str>::as_ref(id).to_owned()));
            args.insert(target_key.to_string(), Value::String(target_id.to_string()));
            BatchCommand::new(CommandType::ItemMove, args)
        })
        .collect()
}

/// Check the status map, then narrow the returned entities to `ids`.
///
/// Failures are reported in submission order; status entries for unknown
/// operation ids are checked afterwards.
pub fn reconcile<S: AsRef<str>>(
    commands: &[BatchCommand],
    result: BatchResult,
    ids: &[S],
) -> Result<Vec<Task>> {
    if let Some(status) = &result.sync_status {
        let submitted: HashSet<&str> = commands.iter().map(|c| c.uuid.as_str()).collect();

        for command in commands {
            if !status.contains_key(&command.uuid) {
                warn!(uuid = %command.uuid, "batch status is missing a submitted command");
            }
        }

        let in_order = commands
            .iter()
            .filter_map(|c| status.get(&c.uuid).map(|s| (c.uuid.as_str(), s)));
        let unexpected = status
            .iter()
            .filter(|(uuid, _)| !submitted.contains(uuid.as_str()))
            .map(|(uuid, s)| (uuid.as_str(), s));

        let first_failure = in_order.chain(unexpected).find_map(|(uuid, s)| match s {
            CommandStatus::Failed(err) => Some((uuid, err)),
            CommandStatus::Ok => None,
        });

        if let Some((uuid, err)) = first_failure {
            return Err(command_error(uuid, err));
        }
    }

    let items = match result.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(TaskLinkError::not_found("tasks not found")),
    };

    let wanted: HashSet<&str> = ids.iter().map(AsRef::<str>::as_ref).collect();
    Ok(items.into_iter().filter(|task| wanted.contains(task.id.as_str())).collect())
}

fn command_error(uuid: &str, err: &CommandError) -> TaskLinkError {
    let context = json!({
        "uuid": uuid,
        "errorCode": err.error_code,
        "errorExtra": err.error_extra,
    });

    let classified =
        TaskLinkError::new(ErrorKind::Batch, err.error.clone()).with_response_data(context);
    match err.http_code {
        Some(code) => classified.with_status(code),
        None => classified,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn task(id: &str) -> Task {
        serde_json::from_value(json!({"id": id, "content": format!("task {id}")})).unwrap()
    }

    fn statuses(commands: &[BatchCommand]) -> HashMap<String, CommandStatus> {
        commands.iter().map(|c| (c.uuid.clone(), CommandStatus::Ok)).collect()
    }

    #[test]
    fn builds_one_command_per_id() {
        let commands = build_move_commands(&["1", "2", "3"], &MoveTarget::Project("p9".into()));

        assert_eq!(commands.len(), 3);
        for (command, id) in commands.iter().zip(["1", "2", "3"]) {
            assert_eq!(command.command_type, CommandType::ItemMove);
            assert_eq!(command.args["id"], json!(id));
            assert_eq!(command.args["project_id"], json!("p9"));
            assert_eq!(command.args.len(), 2);
        }
    }

    #[test]
    fn operation_ids_are_unique_for_a_full_batch() {
        let ids: Vec<String> = (0..MAX_BATCH_COMMANDS).map(|i| i.to_string()).collect();
        let commands = build_move_commands(&ids, &MoveTarget::Section("s".into()));

        let unique: HashSet<&str> = commands.iter().map(|c| c.uuid.as_str()).collect();
        assert_eq!(unique.len(), MAX_BATCH_COMMANDS);
    }

    #[test]
    fn first_failure_in_submission_order_wins() {
        let commands = build_move_commands(&["1", "2", "3"], &MoveTarget::Parent("x".into()));
        let mut status = statuses(&commands);
        for (i, message) in [(1, "second failed"), (2, "third failed")] {
            status.insert(
                commands[i].uuid.clone(),
                CommandStatus::Failed(CommandError {
                    error: message.to_string(),
                    error_code: Some(20),
                    http_code: Some(400),
                    error_extra: None,
                }),
            );
        }

        let result = BatchResult { items: Some(vec![task("1")]), sync_status: Some(status) };
        let err = reconcile(&commands, result, &["1", "2", "3"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Batch);
        assert_eq!(err.message(), "second failed");
        assert_eq!(err.http_status_code(), Some(400));
        assert_eq!(err.response_data().unwrap()["errorCode"], json!(20));
    }

    #[test]
    fn missing_or_empty_items_is_not_found() {
        let commands = build_move_commands(&["1"], &MoveTarget::Project("p".into()));

        let none = BatchResult { items: None, sync_status: Some(statuses(&commands)) };
        assert_eq!(reconcile(&commands, none, &["1"]).unwrap_err().kind(), ErrorKind::NotFound);

        let empty = BatchResult { items: Some(vec![]), sync_status: None };
        assert_eq!(reconcile(&commands, empty, &["1"]).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn filters_to_requested_ids_preserving_order() {
        let commands = build_move_commands(&["1", "3"], &MoveTarget::Project("p".into()));
        let result = BatchResult {
            items: Some(vec![task("3"), task("2"), task("1")]),
            sync_status: Some(statuses(&commands)),
        };

        let moved = reconcile(&commands, result, &["1", "3"]).unwrap();
        let ids: Vec<&str> = moved.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
