//! Request/outcome DTOs passed across the collaborator boundary.
//!
//! These are intentionally flat and serializable so a future out-of-process
//! worker (invoked over a queue or RPC boundary rather than in-process)
//! could adopt the same shapes without the orchestration core noticing.
//! Request structs carry a progress callback and cancellation probe, so
//! they implement `Debug` by hand, skipping the closure fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reports fractional progress (`0.0..=100.0`) and a human-readable status
/// line back to the caller while a long-running collaborator call is in
/// flight. Plumbed through as a plain closure rather than a channel so
/// stub and real adapters share one call shape.
pub type ProgressCallback = Arc<dyn Fn(f64, &str) + Send + Sync>;

/// Polled cooperatively between units of work; returns `true` once the
/// task has been cancelled and the collaborator should stop early.
pub type CancellationProbe = Arc<dyn Fn() -> bool + Send + Sync>;

pub fn noop_progress() -> ProgressCallback {
    Arc::new(|_, _| {})
}

pub fn never_cancelled() -> CancellationProbe {
    Arc::new(|| false)
}

/// A single subtitle line with its timing window, matching the shape an
/// `.srt` file round-trips through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

macro_rules! collaborator_request {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: $ty,)*
            #[serde(skip, default = "noop_progress")]
            pub progress: ProgressCallback,
            #[serde(skip, default = "never_cancelled")]
            pub cancelled: CancellationProbe,
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &self.$field))*
                    .finish_non_exhaustive()
            }
        }
    };
}

collaborator_request!(DownloadRequest {
    url: String,
    destination_dir: String,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub video_path: String,
    pub title: String,
    pub duration_seconds: f64,
}

collaborator_request!(TranscribeRequest {
    video_path: String,
    language_hint: Option<String>,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeOutcome {
    pub srt_path: String,
    pub segments: Vec<SubtitleSegment>,
    pub detected_language: String,
}

collaborator_request!(TranslateRequest {
    srt_path: String,
    target_language: String,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateOutcome {
    pub translated_srt_path: String,
    pub segments: Vec<SubtitleSegment>,
}

collaborator_request!(SynthesizeRequest {
    video_path: String,
    subtitle_path: String,
    destination_dir: String,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeOutcome {
    pub output_video_path: String,
}

collaborator_request!(EnhanceRequest {
    video_path: String,
    destination_dir: String,
    scale_factor: u32,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceOutcome {
    pub output_video_path: String,
}

collaborator_request!(CleanRequest {
    video_path: String,
    destination_dir: String,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanOutcome {
    pub output_video_path: String,
}

/// Uniform failure type a collaborator returns; the orchestration core
/// wraps it as `OrchestrationError::Worker` at the call site.
#[derive(Debug, Clone)]
pub struct WorkerFailure(pub String);

impl WorkerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for WorkerFailure {}

pub type WorkerResult<T> = Result<T, WorkerFailure>;
