//! transcribo - chunked audio transcription on top of whisper.cpp
//!
//! Loads one speech model, splits long recordings into fixed-duration chunks,
//! runs the engine on each, and assembles a single timestamped transcript
//! with per-segment confidence and progress reporting.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod options;
pub mod output;
pub mod stt;

// Engine seam
pub use engine::{EngineContext, EngineParams, RawSegment, RawToken, SpeechEngine};
pub use engine::whisper::WhisperEngine;

// Orchestration
pub use stt::progress::ProgressSink;
pub use stt::transcriber::{
    CancellationToken, TranscribeControls, Transcriber, TranscriberConfig,
};
pub use stt::types::{ModelInfo, Segment, TranscriptionResult};

// Options and config
pub use config::Config;
pub use options::TranscriptionOptions;

// Error handling
pub use error::{AudioError, LoadError, OptionsError, TranscribeError};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
