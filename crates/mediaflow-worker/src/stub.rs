//! Stand-in collaborator adapters.
//!
//! None of these touch a GPU, shell out to `yt-dlp`/`ffmpeg`, or call a
//! translation API — they synthesize plausible output paths and segments
//! so the orchestration core's pipeline and handler logic can be
//! exercised end-to-end in tests without any real media tooling
//! installed. Each still reports progress and honours cancellation the
//! same way a real adapter would, so step-level cancellation tests
//! behave identically against stub and real implementations.

use crate::traits::{Cleaner, Downloader, Enhancer, Synthesizer, Transcriber, Translator};
use crate::types::{
    CleanOutcome, CleanRequest, DownloadOutcome, DownloadRequest, EnhanceOutcome, EnhanceRequest,
    SubtitleSegment, SynthesizeOutcome, SynthesizeRequest, TranscribeOutcome, TranscribeRequest,
    TranslateOutcome, TranslateRequest, WorkerFailure, WorkerResult,
};
use async_trait::async_trait;
use std::path::Path;

async fn step_delay() {
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
}

fn derive_name(path: &str, suffix: &str, extension: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let dir = Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    if dir.is_empty() {
        format!("{stem}{suffix}.{extension}")
    } else {
        format!("{dir}/{stem}{suffix}.{extension}")
    }
}

/// Pretends to fetch `request.url`, producing a video path under
/// `request.destination_dir` derived from the URL's last path segment.
#[derive(Debug, Default)]
pub struct StubDownloader;

#[async_trait]
impl Downloader for StubDownloader {
    async fn download(&self, request: DownloadRequest) -> WorkerResult<DownloadOutcome> {
        (request.progress)(0.0, "starting download");
        if request.url.trim().is_empty() {
            return Err(WorkerFailure::new("download url must not be empty"));
        }
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("download cancelled"));
        }
        let slug = request
            .url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("video");
        let video_path = format!("{}/{}.mp4", request.destination_dir.trim_end_matches('/'), slug);
        (request.progress)(100.0, "download complete");
        Ok(DownloadOutcome {
            video_path,
            title: slug.to_string(),
            duration_seconds: 120.0,
        })
    }
}

/// Synthesizes a fixed two-line subtitle track for any input video.
#[derive(Debug, Default)]
pub struct StubTranscriber;

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, request: TranscribeRequest) -> WorkerResult<TranscribeOutcome> {
        (request.progress)(0.0, "transcribing audio");
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("transcription cancelled"));
        }
        let segments = vec![
            SubtitleSegment {
                start_seconds: 0.0,
                end_seconds: 2.5,
                text: "Hello and welcome.".to_string(),
            },
            SubtitleSegment {
                start_seconds: 2.5,
                end_seconds: 5.0,
                text: "Thanks for watching.".to_string(),
            },
        ];
        let srt_path = derive_name(&request.video_path, "", "srt");
        (request.progress)(100.0, "transcription complete");
        Ok(TranscribeOutcome {
            srt_path,
            segments,
            detected_language: request.language_hint.unwrap_or_else(|| "en".to_string()),
        })
    }
}

/// Appends a bracketed target-language tag to every subtitle line rather
/// than performing a real translation.
#[derive(Debug, Default)]
pub struct StubTranslator;

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, request: TranslateRequest) -> WorkerResult<TranslateOutcome> {
        (request.progress)(0.0, "translating subtitles");
        if request.target_language.trim().is_empty() {
            return Err(WorkerFailure::new("target_language must not be empty"));
        }
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("translation cancelled"));
        }
        let segments = vec![SubtitleSegment {
            start_seconds: 0.0,
            end_seconds: 2.5,
            text: format!("[{}] Hello and welcome.", request.target_language),
        }];
        let translated_srt_path = derive_name(&request.srt_path, ".translated", "srt");
        (request.progress)(100.0, "translation complete");
        Ok(TranslateOutcome {
            translated_srt_path,
            segments,
        })
    }
}

/// Pretends to burn `request.subtitle_path` into `request.video_path`.
#[derive(Debug, Default)]
pub struct StubSynthesizer;

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, request: SynthesizeRequest) -> WorkerResult<SynthesizeOutcome> {
        (request.progress)(0.0, "burning in subtitles");
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("synthesis cancelled"));
        }
        let stem = Path::new(&request.video_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let output_video_path = format!(
            "{}/{}.subtitled.mp4",
            request.destination_dir.trim_end_matches('/'),
            stem
        );
        (request.progress)(100.0, "synthesis complete");
        Ok(SynthesizeOutcome { output_video_path })
    }
}

/// Pretends to upscale `request.video_path` by `request.scale_factor`.
#[derive(Debug, Default)]
pub struct StubEnhancer;

#[async_trait]
impl Enhancer for StubEnhancer {
    async fn enhance(&self, request: EnhanceRequest) -> WorkerResult<EnhanceOutcome> {
        (request.progress)(0.0, "enhancing video");
        if request.scale_factor == 0 {
            return Err(WorkerFailure::new("scale_factor must be greater than zero"));
        }
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("enhancement cancelled"));
        }
        let stem = Path::new(&request.video_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let output_video_path = format!(
            "{}/{}.{}x.mp4",
            request.destination_dir.trim_end_matches('/'),
            stem,
            request.scale_factor
        );
        (request.progress)(100.0, "enhancement complete");
        Ok(EnhanceOutcome { output_video_path })
    }
}

/// Pretends to strip a watermark from `request.video_path`.
#[derive(Debug, Default)]
pub struct StubCleaner;

#[async_trait]
impl Cleaner for StubCleaner {
    async fn clean(&self, request: CleanRequest) -> WorkerResult<CleanOutcome> {
        (request.progress)(0.0, "removing watermark");
        step_delay().await;
        if (request.cancelled)() {
            return Err(WorkerFailure::new("cleanup cancelled"));
        }
        let stem = Path::new(&request.video_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let output_video_path = format!(
            "{}/{}.clean.mp4",
            request.destination_dir.trim_end_matches('/'),
            stem
        );
        (request.progress)(100.0, "cleanup complete");
        Ok(CleanOutcome { output_video_path })
    }
}
