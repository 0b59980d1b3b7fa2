//! Scriptable in-process engine for tests and benchmarks.
//!
//! Every `run` call is recorded, and the number of live contexts is tracked
//! so tests can check that reloads free the old context exactly once.

use crate::engine::{EngineContext, EngineParams, RawSegment, RawToken, SpeechEngine};
use crate::error::EngineError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Produces the segments for a chunk, given `(chunk_index, samples)`.
pub type SegmentScript = dyn Fn(usize, &[f32]) -> Vec<RawSegment> + Send + Sync;

/// A recorded `run` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    pub chunk_index: usize,
    pub samples: usize,
    pub params: EngineParams,
}

#[derive(Default)]
struct Shared {
    runs: Mutex<Vec<RecordedRun>>,
    loads: Mutex<Vec<PathBuf>>,
    live_contexts: AtomicUsize,
}

/// Mock speech engine.
#[derive(Clone)]
pub struct MockEngine {
    script: Arc<SegmentScript>,
    detected_language: Option<String>,
    fail_on_chunk: Option<usize>,
    reject_models: bool,
    ignore_forced_language: bool,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("detected_language", &self.detected_language)
            .field("fail_on_chunk", &self.fail_on_chunk)
            .field("reject_models", &self.reject_models)
            .field("ignore_forced_language", &self.ignore_forced_language)
            .finish()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Engine that emits one segment spanning each chunk, text "chunk N".
    pub fn new() -> Self {
        Self {
            script: Arc::new(|index, samples| {
                vec![RawSegment {
                    start_ticks: 0,
                    end_ticks: (samples.len() / 160) as i64,
                    text: format!(" chunk {index}"),
                    tokens: vec![RawToken { probability: 0.9 }; 3],
                    confidence: None,
                }]
            }),
            detected_language: Some("en".to_string()),
            fail_on_chunk: None,
            reject_models: false,
            ignore_forced_language: false,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Replace the per-chunk segment generator.
    pub fn with_script<F>(mut self, script: F) -> Self
    where
        F: Fn(usize, &[f32]) -> Vec<RawSegment> + Send + Sync + 'static,
    {
        self.script = Arc::new(script);
        self
    }

    /// Emit no segments at all (silence).
    pub fn silent(self) -> Self {
        self.with_script(|_, _| Vec::new())
    }

    pub fn with_detected_language(mut self, language: Option<&str>) -> Self {
        self.detected_language = language.map(str::to_string);
        self
    }

    /// Fail the run for the given chunk index with a non-zero status.
    pub fn with_failure_on_chunk(mut self, chunk_index: usize) -> Self {
        self.fail_on_chunk = Some(chunk_index);
        self
    }

    /// Report the detected language even when the caller forced one.
    pub fn ignoring_forced_language(mut self) -> Self {
        self.ignore_forced_language = true;
        self
    }

    /// Reject every model file at init.
    pub fn rejecting_models(mut self) -> Self {
        self.reject_models = true;
        self
    }

    /// All runs so far, in call order.
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.shared
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every path passed to a successful `init`.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.shared
            .loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contexts initialised and not yet dropped.
    pub fn live_contexts(&self) -> usize {
        self.shared.live_contexts.load(Ordering::SeqCst)
    }
}

impl SpeechEngine for MockEngine {
    fn init(&self, model_path: &Path) -> Result<Box<dyn EngineContext>, EngineError> {
        if self.reject_models {
            return Err(EngineError::Init {
                message: format!("not a model file: {}", model_path.display()),
            });
        }

        self.shared
            .loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(model_path.to_path_buf());
        self.shared.live_contexts.fetch_add(1, Ordering::SeqCst);

        let model_type = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_start_matches("ggml-").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Box::new(MockContext {
            engine: self.clone(),
            model_type,
            next_chunk: 0,
            last_language: None,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockContext {
    engine: MockEngine,
    model_type: String,
    next_chunk: usize,
    last_language: Option<String>,
}

impl EngineContext for MockContext {
    fn run(
        &mut self,
        samples: &[f32],
        params: &EngineParams,
    ) -> Result<Vec<RawSegment>, EngineError> {
        let chunk_index = self.next_chunk;
        self.next_chunk += 1;

        self.engine
            .shared
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRun {
                chunk_index,
                samples: samples.len(),
                params: params.clone(),
            });

        if self.engine.fail_on_chunk == Some(chunk_index) {
            return Err(EngineError::Run {
                status: -1,
                message: format!("scripted failure on chunk {chunk_index}"),
            });
        }

        self.last_language = if self.engine.ignore_forced_language {
            self.engine.detected_language.clone()
        } else {
            params
                .language
                .clone()
                .or_else(|| self.engine.detected_language.clone())
        };
        Ok((self.engine.script)(chunk_index, samples))
    }

    fn detected_language(&self) -> Option<String> {
        self.last_language.clone()
    }

    fn model_type(&self) -> String {
        self.model_type.clone()
    }

    fn is_multilingual(&self) -> bool {
        !self.model_type.ends_with(".en")
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.engine
            .shared
            .live_contexts
            .fetch_sub(1, Ordering::SeqCst);
    }
}
