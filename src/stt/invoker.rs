//! Per-chunk engine invocation.
//!
//! Maps [`TranscriptionOptions`] onto [`EngineParams`] once per call, runs
//! the engine on each chunk, and converts the engine's chunk-relative tick
//! timestamps into absolute seconds.

use crate::audio::chunker::AudioChunk;
use crate::defaults;
use crate::engine::{EngineContext, EngineParams, RawSegment};
use crate::error::{InferenceError, OptionsError};
use crate::options::TranscriptionOptions;
use crate::stt::confidence;
use tracing::debug;

/// A scored segment in absolute recording time, not yet numbered.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f32,
}

/// Everything one chunk produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput {
    pub segments: Vec<TimedSegment>,
    /// Language the engine reports for this chunk.
    pub language: Option<String>,
}

/// Runs the engine chunk by chunk with a fixed configuration.
#[derive(Debug, Clone)]
pub struct InferenceInvoker {
    params: EngineParams,
    sample_rate: u32,
}

impl InferenceInvoker {
    /// Validate `options` and derive the engine configuration.
    pub fn new(options: &TranscriptionOptions, sample_rate: u32) -> Result<Self, OptionsError> {
        options.validate()?;
        let params = EngineParams {
            language: options.forced_language(),
            translate: options.translate,
            threads: options.threads,
            initial_prompt: options
                .initial_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            use_gpu: options.use_gpu,
        };
        Ok(Self {
            params,
            sample_rate,
        })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Run one chunk and rebase its segments onto the recording timeline.
    pub fn run(
        &self,
        context: &mut dyn EngineContext,
        chunk: &AudioChunk<'_>,
    ) -> Result<ChunkOutput, InferenceError> {
        let chunk_start = chunk.start_secs(self.sample_rate);
        let chunk_end = chunk.end_secs(self.sample_rate);

        let raw = context
            .run(chunk.samples, &self.params)
            .map_err(|source| InferenceError {
                chunk: chunk.index,
                offset_secs: chunk_start,
                source,
            })?;
        debug!(
            "chunk {} [{:.2}s, {:.2}s): {} segments",
            chunk.index,
            chunk_start,
            chunk_end,
            raw.len()
        );

        let segments = raw
            .iter()
            .map(|segment| rebase(segment, chunk_start, chunk_end))
            .collect();

        Ok(ChunkOutput {
            segments,
            language: context.detected_language(),
        })
    }
}

/// Convert ticks to absolute seconds, clamped to the chunk's span.
fn rebase(segment: &RawSegment, chunk_start: f64, chunk_end: f64) -> TimedSegment {
    let to_secs = |ticks: i64| {
        (chunk_start + ticks.max(0) as f64 * defaults::SECONDS_PER_TICK).min(chunk_end)
    };
    let start = to_secs(segment.start_ticks);
    let end = to_secs(segment.end_ticks).max(start);

    TimedSegment {
        start,
        end,
        text: segment.text.trim().to_string(),
        confidence: confidence::score(segment),
    }
}
