//! Concrete resume [`crate::registry::handlers::ResumeHandler`]
//! implementations, one per task type: reconstructs the original
//! request from a persisted `request_params` and re-dispatches it
//! through the same Pipeline Runner or Background Task Runner path a
//! fresh submission would take.

mod cleanup;
mod enhancement;
mod pipeline;
mod synthesis;
mod transcribe;

pub use cleanup::CleanupHandler;
pub use enhancement::EnhancementHandler;
pub use pipeline::PipelineHandler;
pub use synthesis::SynthesisHandler;
pub use transcribe::TranscribeHandler;
