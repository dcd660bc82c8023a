//! Async traits each collaborator implements. Every method owns its
//! request and returns a [`WorkerResult`], so a pipeline step or resume
//! handler can call through a `dyn Trait` without knowing whether the
//! real implementation shells out to `yt-dlp`, loads a local ASR model,
//! or calls a remote translation API.

use crate::types::{
    CleanOutcome, CleanRequest, DownloadOutcome, DownloadRequest, EnhanceOutcome, EnhanceRequest,
    SynthesizeOutcome, SynthesizeRequest, TranscribeOutcome, TranscribeRequest, TranslateOutcome,
    TranslateRequest, WorkerResult,
};
use async_trait::async_trait;

/// Fetches source media from a URL onto local disk.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, request: DownloadRequest) -> WorkerResult<DownloadOutcome>;
}

/// Produces a subtitle track from a video's audio track.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, request: TranscribeRequest) -> WorkerResult<TranscribeOutcome>;
}

/// Translates an existing subtitle track into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: TranslateRequest) -> WorkerResult<TranslateOutcome>;
}

/// Burns a subtitle track into a video, producing a new rendered file.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesizeRequest) -> WorkerResult<SynthesizeOutcome>;
}

/// Upscales/restores a video (e.g. super-resolution).
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, request: EnhanceRequest) -> WorkerResult<EnhanceOutcome>;
}

/// Removes watermarks or other unwanted artifacts from a video.
#[async_trait]
pub trait Cleaner: Send + Sync {
    async fn clean(&self, request: CleanRequest) -> WorkerResult<CleanOutcome>;
}
