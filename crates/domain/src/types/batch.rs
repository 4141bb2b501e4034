//! Batch ("sync") command envelope and result types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::task::Task;

/// Upper bound on commands accepted in a single batch request.
pub const MAX_BATCH_COMMANDS: usize = 100;

/// Literal the service uses to mark a successful command.
pub const COMMAND_OK: &str = "ok";

/// Command-type tags understood by the batch endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Relocate an item to another project, section or parent.
    ItemMove,
}

/// One unit of a batch mutation, already in wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchCommand {
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub uuid: String,
    pub args: Map<String, Value>,
}

impl BatchCommand {
    /// Build a command with a freshly generated operation id.
    ///
    /// Ids are random v4 UUIDs so concurrent batches need no shared counter.
    pub fn new(command_type: CommandType, args: Map<String, Value>) -> Self {
        Self { command_type, uuid: Uuid::new_v4().to_string(), args }
    }
}

/// Request body posted to the batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEnvelope {
    pub commands: Vec<BatchCommand>,
    pub resource_types: Vec<String>,
}

/// Where a moved entity should land. Exactly one destination per move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Project(String),
    Section(String),
    Parent(String),
}

impl MoveTarget {
    /// Wire-format argument name and value for this destination.
    pub fn wire_arg(&self) -> (&'static str, &str) {
        match self {
            Self::Project(id) => ("project_id", id),
            Self::Section(id) => ("section_id", id),
            Self::Parent(id) => ("parent_id", id),
        }
    }
}

/// Structured error reported for a single command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub error: String,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub http_code: Option<u16>,
    #[serde(default)]
    pub error_extra: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommandStatus {
    Marker(String),
    Failed(CommandError),
}

/// Per-command outcome in a batch result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCommandStatus")]
pub enum CommandStatus {
    Ok,
    Failed(CommandError),
}

impl From<RawCommandStatus> for CommandStatus {
    fn from(raw: RawCommandStatus) -> Self {
        match raw {
            RawCommandStatus::Marker(marker) if marker == COMMAND_OK => Self::Ok,
            // Any other bare string is treated as the error message.
            RawCommandStatus::Marker(other) => Self::Failed(CommandError {
                error: other,
                error_code: None,
                http_code: None,
                error_extra: None,
            }),
            RawCommandStatus::Failed(error) => Self::Failed(error),
        }
    }
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// The service's reconciliation of a submitted batch (object-format casing).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    #[serde(default)]
    pub items: Option<Vec<Task>>,
    #[serde(default)]
    pub sync_status: Option<HashMap<String, CommandStatus>>,
}
