//! Application layer: CLI-facing flows built on the infrastructure clients

pub mod batch;
pub mod links;
pub mod single;

pub use batch::{BatchDriver, BatchSummary};
