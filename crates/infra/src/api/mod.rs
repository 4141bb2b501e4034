//! Caller-facing API surface
//!
//! Per-entity task operations built on the request executor and the batch
//! protocol.

pub mod client;

pub use client::{TaskClient, TaskClientBuilder};
