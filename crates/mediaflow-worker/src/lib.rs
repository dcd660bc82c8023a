//! Collaborator interfaces consumed by the orchestration core.
//!
//! The concrete downloader, ASR engine, LLM translator, video
//! synthesizer, super-resolution and watermark-removal workers are only
//! specified at their interface boundary — this crate *is* that
//! boundary. It defines the traits the bundled pipeline steps and
//! resume handlers depend on, plus `stub` adapters minimal enough to
//! drive the orchestration core end-to-end in tests without any real
//! media tooling installed.

pub mod stub;
pub mod traits;
pub mod types;

pub use traits::{Cleaner, Downloader, Enhancer, Synthesizer, Transcriber, Translator};
pub use types::*;
