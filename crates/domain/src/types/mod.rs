//! Domain entity and wire types

pub mod batch;
pub mod task;

pub use batch::*;
pub use task::*;
