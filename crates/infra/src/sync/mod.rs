//! Batch ("sync") mutation protocol
//!
//! Multi-entity mutations submitted as one command envelope and reconciled
//! against the per-command status map.

pub mod batch;

pub use batch::{build_move_commands, reconcile, SyncBatchClient, SYNC_PATH};
