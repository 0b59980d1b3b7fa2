//! Error types for transcribo.

use thiserror::Error;

/// A `load`/`transcribe`/`release` call was made while the same thread
/// already holds the model lock (typically from inside a progress sink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("model handle is already in use by this thread ({operation} re-entered during a transcription)")]
pub struct ReentrancyError {
    pub operation: &'static str,
}

/// Failure reported by the speech engine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine rejected model: {message}")]
    Init { message: String },

    #[error("engine returned status {status}: {message}")]
    Run { status: i32, message: String },

    #[error("engine unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors from `ModelHandle::load` and `Transcriber::load`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model file is not readable at {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Engine failed to initialise model at {path}: {source}")]
    EngineInitFailed {
        path: String,
        #[source]
        source: EngineError,
    },

    #[error("No model has been loaded yet, nothing to reload")]
    NothingToReload,

    #[error(transparent)]
    Reentrancy(#[from] ReentrancyError),

    #[error("Background load task failed: {message}")]
    Task { message: String },
}

/// A single chunk's engine invocation failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Inference failed on chunk {chunk} (starting at {offset_secs:.2}s): {source}")]
pub struct InferenceError {
    pub chunk: usize,
    pub offset_secs: f64,
    #[source]
    pub source: EngineError,
}

/// Invalid or wrongly-typed transcription option.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid option {key}: {message}")]
pub struct OptionsError {
    pub key: String,
    pub message: String,
}

impl OptionsError {
    pub fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Errors from decoding WAV input.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to parse WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    FormatMismatch { expected: String, actual: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from `Transcriber::transcribe`.
///
/// A failed call never carries partial segments.
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("No model loaded, call load() first")]
    ModelNotLoaded,

    #[error("Invalid audio: {message}")]
    InvalidAudio { message: String },

    #[error(transparent)]
    InvalidOption(#[from] OptionsError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Reentrancy(#[from] ReentrancyError),

    #[error("Transcription cancelled after {chunks_done} of {chunks_total} chunks")]
    Cancelled {
        chunks_done: usize,
        chunks_total: usize,
    },

    #[error("Background transcription task failed: {message}")]
    Task { message: String },
}
