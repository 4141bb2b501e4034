//! # TaskLink Domain
//!
//! Domain types shared by the TaskLink client.
//!
//! This crate contains:
//! - The single error type surfaced to callers and its Result alias
//! - Task entity and batch ("sync") wire types
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other TaskLink crates
//! - No I/O; pure data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
