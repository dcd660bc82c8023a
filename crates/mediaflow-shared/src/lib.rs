//! Shared vocabulary for the MediaFlow orchestration core.
//!
//! This crate holds everything the orchestration and worker crates need
//! to agree on without depending on each other: the `Task` data model,
//! the wire messages pushed to observers, the error taxonomy, process
//! configuration, and the tracing bootstrap.

pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
pub mod task;

pub use error::{OrchestrationError, OrchestrationResult};
pub use task::{FileRef, Task, TaskResult, TaskStatus};
