//! The four bundled pipeline steps, ported from the original
//! `core/steps/*.py` modules.

mod download;
mod synthesize;
mod transcribe;
mod translate;

pub use download::DownloadStep;
pub use synthesize::SynthesizeStep;
pub use transcribe::TranscribeStep;
pub use translate::TranslateStep;
