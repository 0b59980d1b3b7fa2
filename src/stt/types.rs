//! Result types returned to callers.

use serde::{Deserialize, Serialize};

/// A timed span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the whole transcript, 0-based and gap-free.
    pub id: usize,
    /// Absolute start in seconds.
    pub start: f64,
    /// Absolute end in seconds, never before `start`.
    pub end: f64,
    pub text: String,
    /// In [0, 1].
    pub confidence: f32,
}

/// Complete transcript of one buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResult {
    /// Segment texts joined with single spaces.
    pub text: String,
    /// Forced language, or the language detected on the first chunk.
    pub language: String,
    /// Input length in seconds.
    pub duration: f64,
    pub segments: Vec<Segment>,
    pub model_type: String,
}

/// Snapshot of the model handle, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub loaded: bool,
    /// Last successfully loaded path, empty if none.
    pub model_path: String,
    pub model_type: Option<String>,
    pub multilingual: Option<bool>,
}
