//! Seam to the external speech-inference engine.
//!
//! The engine is a black box that turns model weights plus a buffer of
//! 16 kHz mono samples into timed text segments. An engine context is owned
//! as a `Box<dyn EngineContext>`: dropping the box frees it.

pub mod mock;
pub mod whisper;

use crate::defaults;
use crate::error::EngineError;
use std::path::Path;

/// Engine configuration for one `run` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineParams {
    /// Forced language, `None` to auto-detect.
    pub language: Option<String>,
    pub translate: bool,
    pub threads: Option<u32>,
    pub initial_prompt: Option<String>,
    /// Compute preference; the engine may ignore it.
    pub use_gpu: Option<bool>,
}

/// Per-token probability as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawToken {
    pub probability: f32,
}

/// A segment as the engine reports it, with chunk-relative tick timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSegment {
    pub start_ticks: i64,
    pub end_ticks: i64,
    pub text: String,
    pub tokens: Vec<RawToken>,
    /// Engine-native confidence; when present it replaces the token mean.
    pub confidence: Option<f32>,
}

/// Loads models. Shared between handles, so it must be thread-safe.
pub trait SpeechEngine: Send + Sync {
    /// Initialise a context from a model file. Failure means the engine
    /// rejected the file; path readability is checked before this is called.
    fn init(&self, model_path: &Path) -> Result<Box<dyn EngineContext>, EngineError>;

    /// Sample rate the engine expects.
    fn sample_rate(&self) -> u32 {
        defaults::SAMPLE_RATE
    }

    /// Engine name for diagnostics.
    fn name(&self) -> &str;
}

/// One live, loaded model. Not assumed to be reentrant.
pub trait EngineContext: Send {
    /// Run inference on one chunk of samples.
    fn run(&mut self, samples: &[f32], params: &EngineParams)
    -> Result<Vec<RawSegment>, EngineError>;

    /// Language detected during the most recent `run`.
    fn detected_language(&self) -> Option<String>;

    /// Model type, e.g. "base" or "large".
    fn model_type(&self) -> String;

    fn is_multilingual(&self) -> bool;
}
