//! End-to-end transcription of one buffer.
//!
//! [`Transcriber`] owns the [`ModelHandle`] behind a mutex. `load`,
//! `release` and `transcribe` each hold that lock for their whole duration,
//! so a transcription never interleaves with another call on the same
//! model. The lock is not reentrant: a call made from inside a progress sink
//! on the transcribing thread fails with [`ReentrancyError`] instead of
//! deadlocking.
//!
//! All methods block. Use [`Transcriber::load_async`] and
//! [`Transcriber::transcribe_async`] (or your own worker thread) to keep them
//! off latency-sensitive threads.

use crate::audio::chunker;
use crate::defaults;
use crate::engine::SpeechEngine;
use crate::error::{LoadError, OptionsError, ReentrancyError, TranscribeError};
use crate::options::TranscriptionOptions;
use crate::stt::handle::ModelHandle;
use crate::stt::invoker::InferenceInvoker;
use crate::stt::progress::{ProgressReporter, ProgressSink};
use crate::stt::types::{ModelInfo, Segment, TranscriptionResult};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriberConfig {
    /// Rate of the sample buffers passed to `transcribe`.
    pub sample_rate: u32,
    /// Nominal chunk duration in seconds.
    pub chunk_secs: f64,
}

impl TranscriberConfig {
    /// Sample rate must be non-zero and `chunk_secs` finite and positive.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.sample_rate == 0 {
            return Err(OptionsError::new("sample_rate", "must be a positive integer"));
        }
        if !self.chunk_secs.is_finite() || self.chunk_secs <= 0.0 {
            return Err(OptionsError::new(
                "chunk_secs",
                format!("must be a positive number of seconds, got {}", self.chunk_secs),
            ));
        }
        Ok(())
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_secs: defaults::CHUNK_SECS,
        }
    }
}

/// Cooperative cancellation, checked between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Optional hooks for one `transcribe` call.
#[derive(Clone, Copy, Default)]
pub struct TranscribeControls<'a> {
    pub progress: Option<&'a dyn ProgressSink>,
    pub cancel: Option<&'a CancellationToken>,
}

/// Exclusive access to the model handle, tagged with the owning thread.
struct HandleGuard<'a> {
    handle: MutexGuard<'a, ModelHandle>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Deref for HandleGuard<'_> {
    type Target = ModelHandle;

    fn deref(&self) -> &ModelHandle {
        &self.handle
    }
}

impl DerefMut for HandleGuard<'_> {
    fn deref_mut(&mut self) -> &mut ModelHandle {
        &mut self.handle
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        *lock_owner(self.owner) = None;
    }
}

fn lock_owner(owner: &Mutex<Option<ThreadId>>) -> MutexGuard<'_, Option<ThreadId>> {
    owner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe transcription service around one model.
pub struct Transcriber {
    handle: Mutex<ModelHandle>,
    /// Thread currently holding `handle`, for reentrancy detection.
    owner: Mutex<Option<ThreadId>>,
    /// Mirrors `handle.is_loaded()` so the query never blocks.
    loaded: AtomicBool,
    config: TranscriberConfig,
}

impl std::fmt::Debug for Transcriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcriber")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Transcriber {
    /// Create around `engine`, rejecting an unusable `config`.
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        config: TranscriberConfig,
    ) -> Result<Self, OptionsError> {
        config.validate()?;
        Ok(Self::build(engine, config))
    }

    /// Create with the default 16 kHz / 30 s configuration.
    pub fn with_engine(engine: Arc<dyn SpeechEngine>) -> Self {
        Self::build(engine, TranscriberConfig::default())
    }

    fn build(engine: Arc<dyn SpeechEngine>, config: TranscriberConfig) -> Self {
        Self {
            handle: Mutex::new(ModelHandle::new(engine)),
            owner: Mutex::new(None),
            loaded: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &TranscriberConfig {
        &self.config
    }

    fn acquire(&self, operation: &'static str) -> Result<HandleGuard<'_>, ReentrancyError> {
        let me = thread::current().id();
        if *lock_owner(&self.owner) == Some(me) {
            warn!("{} called while this thread holds the model lock", operation);
            return Err(ReentrancyError { operation });
        }

        let handle = self.handle.lock().unwrap_or_else(|poisoned| {
            warn!("model lock was poisoned by a panic, recovering");
            poisoned.into_inner()
        });
        *lock_owner(&self.owner) = Some(me);
        Ok(HandleGuard {
            handle,
            owner: &self.owner,
        })
    }

    /// Load (or replace) the model. On failure the model is unloaded.
    pub fn load(&self, path: &Path) -> Result<(), LoadError> {
        let mut handle = self.acquire("load")?;
        let result = handle.load(path);
        self.loaded.store(handle.is_loaded(), Ordering::SeqCst);
        result
    }

    /// Load the last successfully loaded model again.
    pub fn reload(&self) -> Result<(), LoadError> {
        let mut handle = self.acquire("reload")?;
        let result = handle.reload();
        self.loaded.store(handle.is_loaded(), Ordering::SeqCst);
        result
    }

    /// Free the model. Safe to call any number of times.
    pub fn release(&self) -> Result<(), ReentrancyError> {
        let mut handle = self.acquire("release")?;
        handle.release();
        self.loaded.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn info(&self) -> Result<ModelInfo, ReentrancyError> {
        Ok(self.acquire("info")?.info())
    }

    /// Transcribe a whole buffer of mono samples at the configured rate.
    pub fn transcribe(
        &self,
        samples: &[f32],
        options: &TranscriptionOptions,
    ) -> Result<TranscriptionResult, TranscribeError> {
        self.transcribe_with(samples, options, TranscribeControls::default())
    }

    /// Transcribe with progress reporting and/or cancellation.
    ///
    /// All-or-nothing: any chunk failure or cancellation discards every
    /// segment produced so far.
    pub fn transcribe_with(
        &self,
        samples: &[f32],
        options: &TranscriptionOptions,
        controls: TranscribeControls<'_>,
    ) -> Result<TranscriptionResult, TranscribeError> {
        let mut handle = self.acquire("transcribe")?;
        if !handle.is_loaded() {
            return Err(TranscribeError::ModelNotLoaded);
        }

        let sample_rate = self.config.sample_rate;
        let engine_rate = handle.engine().sample_rate();
        if sample_rate != engine_rate {
            return Err(TranscribeError::InvalidAudio {
                message: format!("engine expects {engine_rate} Hz, got {sample_rate} Hz"),
            });
        }
        validate_samples(samples)?;
        let invoker = InferenceInvoker::new(options, sample_rate)?;

        let Some(context) = handle.context_mut() else {
            return Err(TranscribeError::ModelNotLoaded);
        };

        let started = Instant::now();
        let chunks = chunker::chunk(samples, self.config.chunk_secs, sample_rate);
        let chunks_total = chunks.len();
        info!(
            "transcribing {:.1}s of audio in {} chunk(s)",
            samples.len() as f64 / sample_rate as f64,
            chunks_total
        );

        let mut reporter = ProgressReporter::new(controls.progress, samples.len());
        let mut segments: Vec<Segment> = Vec::new();
        let mut text = String::new();
        let mut detected_language: Option<String> = None;

        for chunk in chunks {
            // Cancellation checkpoint
            if controls.cancel.is_some_and(CancellationToken::is_cancelled) {
                info!("transcription cancelled before chunk {}", chunk.index);
                return Err(TranscribeError::Cancelled {
                    chunks_done: chunk.index,
                    chunks_total,
                });
            }

            let output = invoker.run(&mut *context, &chunk).inspect_err(|e| {
                warn!("{}", e);
            })?;

            if detected_language.is_none() {
                detected_language = output.language.filter(|l| !l.is_empty());
            }

            for timed in output.segments {
                let (prev_start, prev_end) = segments
                    .last()
                    .map_or((0.0, 0.0), |s: &Segment| (s.start, s.end));
                let start = timed.start.max(prev_start);
                let end = timed.end.max(start).max(prev_end);

                if !timed.text.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&timed.text);
                }

                segments.push(Segment {
                    id: segments.len(),
                    start,
                    end,
                    text: timed.text,
                    confidence: timed.confidence,
                });
            }

            reporter.report(chunk.offset + chunk.samples.len());
        }

        let language = result_language(options, detected_language);

        debug!(
            "transcribed {} segments in {:.2?}",
            segments.len(),
            started.elapsed()
        );

        Ok(TranscriptionResult {
            text,
            language,
            duration: samples.len() as f64 / sample_rate as f64,
            segments,
            model_type: context.model_type(),
        })
    }

    /// [`load`](Self::load) on tokio's blocking pool.
    pub async fn load_async(self: &Arc<Self>, path: PathBuf) -> Result<(), LoadError> {
        let transcriber = Arc::clone(self);
        tokio::task::spawn_blocking(move || transcriber.load(&path))
            .await
            .map_err(|e| LoadError::Task {
                message: e.to_string(),
            })?
    }

    /// [`transcribe_with`](Self::transcribe_with) on tokio's blocking pool.
    ///
    /// The sink runs on the blocking thread.
    pub async fn transcribe_async(
        self: &Arc<Self>,
        samples: Vec<f32>,
        options: TranscriptionOptions,
        progress: Option<Box<dyn ProgressSink + Send>>,
        cancel: Option<CancellationToken>,
    ) -> Result<TranscriptionResult, TranscribeError> {
        let transcriber = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let progress: Option<&dyn ProgressSink> = match &progress {
                Some(sink) => {
                    let sink: &dyn ProgressSink = &**sink;
                    Some(sink)
                }
                None => None,
            };
            let controls = TranscribeControls {
                progress,
                cancel: cancel.as_ref(),
            };
            transcriber.transcribe_with(&samples, &options, controls)
        })
        .await
        .map_err(|e| TranscribeError::Task {
            message: e.to_string(),
        })?
    }
}

/// Forced language verbatim, otherwise the first detection or "unknown".
fn result_language(options: &TranscriptionOptions, detected: Option<String>) -> String {
    match (&options.language, options.forced_language()) {
        (Some(forced), Some(code)) => {
            if let Some(reported) = detected
                && !reported.eq_ignore_ascii_case(&code)
            {
                warn!(
                    "language forced to '{}' but the engine reported '{}'",
                    forced, reported
                );
            }
            forced.clone()
        }
        _ => detected.unwrap_or_else(|| defaults::UNKNOWN_LANGUAGE.to_string()),
    }
}

/// Reject empty buffers and non-finite samples.
fn validate_samples(samples: &[f32]) -> Result<(), TranscribeError> {
    if samples.is_empty() {
        return Err(TranscribeError::InvalidAudio {
            message: "sample buffer is empty".to_string(),
        });
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(TranscribeError::InvalidAudio {
            message: format!("sample {index} is not a finite number"),
        });
    }
    Ok(())
}
