//! # TaskLink Infrastructure
//!
//! I/O side of the TaskLink client.
//!
//! This crate contains:
//! - The request executor (retry, timeout, cancellation, pluggable transport)
//! - Key-casing conversion between wire and object formats
//! - Failure classification into the domain error type
//! - The batch ("sync") mutation protocol
//! - The caller-facing task client and configuration loader
//!
//! ## Architecture
//! - Depends on `tasklink-domain` for types and errors
//! - Contains all "impure" code (network, environment, files)

pub mod api;
pub mod casing;
pub mod config;
pub mod errors;
pub mod http;
pub mod sync;

// Re-export commonly used items
pub use api::{TaskClient, TaskClientBuilder};
pub use casing::{to_object_format, to_wire_format};
pub use errors::FailureClass;
pub use http::{
    HttpResponse, HttpTransport, RequestDescriptor, RequestExecutor, ReqwestTransport,
    RetryPolicy, TransportError, TransportRequest, TransportResponse,
};
pub use sync::SyncBatchClient;
