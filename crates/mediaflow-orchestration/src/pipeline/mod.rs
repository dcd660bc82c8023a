//! Pipeline execution: the mutable [`PipelineContext`], the bundled
//! [`steps`], and the [`PipelineRunner`] that drives an ordered list of
//! them against a single Task.

pub mod context;
pub mod runner;
pub mod steps;

pub use context::PipelineContext;
pub use runner::{PipelineRequestParams, PipelineRunner, PipelineStepRequest};
