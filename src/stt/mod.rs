//! Transcription orchestration: model lifetime, per-chunk inference,
//! confidence scoring and progress.

pub mod confidence;
pub mod handle;
pub mod invoker;
pub mod progress;
pub mod transcriber;
pub mod types;
