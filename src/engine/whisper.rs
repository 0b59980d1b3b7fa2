//! whisper.cpp engine binding.
//!
//! # Feature Gate
//!
//! The real binding requires the `whisper` feature and cmake:
//!
//! ```bash
//! cargo build --features whisper
//! ```
//!
//! Without it, [`WhisperEngine`] still exists but every `init` fails with
//! [`EngineError::Unavailable`], so callers get a typed load error instead
//! of a missing symbol.

use crate::engine::{EngineContext, SpeechEngine};
use crate::error::EngineError;
use std::path::Path;

#[cfg(feature = "whisper")]
use crate::engine::{EngineParams, RawSegment, RawToken};
#[cfg(feature = "whisper")]
use std::sync::Once;
#[cfg(feature = "whisper")]
use tracing::{info, warn};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// whisper.cpp speech engine.
#[derive(Debug, Clone)]
pub struct WhisperEngine {
    /// Compute preference applied when a context is created.
    use_gpu: Option<bool>,
    /// Use flash attention kernels (avoids the standalone softmax kernel).
    flash_attn: bool,
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WhisperEngine {
    pub fn new() -> Self {
        Self {
            use_gpu: None,
            flash_attn: true,
        }
    }

    /// Prefer (or avoid) the GPU for contexts created by this engine.
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = Some(use_gpu);
        self
    }
}

#[cfg(feature = "whisper")]
impl SpeechEngine for WhisperEngine {
    fn init(&self, model_path: &Path) -> Result<Box<dyn EngineContext>, EngineError> {
        // Route whisper.cpp's own logging away from stderr (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let path = model_path.to_str().ok_or_else(|| EngineError::Init {
            message: "Invalid UTF-8 in model path".to_string(),
        })?;

        let context = open_context(path, self.flash_attn, self.use_gpu).map_err(|e| {
            EngineError::Init {
                message: format!("Failed to load Whisper model: {}", e),
            }
        })?;

        let model_type = context
            .model_type_readable()
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Box::new(WhisperEngineContext {
            context,
            path: path.to_string(),
            flash_attn: self.flash_attn,
            use_gpu: self.use_gpu.unwrap_or(GPU_BUILD),
            model_type,
            last_language: None,
        }))
    }

    fn name(&self) -> &str {
        "whisper.cpp"
    }
}

#[cfg(not(feature = "whisper"))]
impl SpeechEngine for WhisperEngine {
    fn init(&self, _model_path: &Path) -> Result<Box<dyn EngineContext>, EngineError> {
        Err(EngineError::Unavailable {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release --features whisper\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn name(&self) -> &str {
        "whisper.cpp (disabled)"
    }
}

/// Whether contexts use the GPU when no preference is given.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
const GPU_BUILD: bool = cfg!(any(feature = "cuda", feature = "vulkan", feature = "hipblas"));

/// The GPU setting a context must be recreated with, or `None` when
/// `requested` is unset or already in effect.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn gpu_switch(current: bool, requested: Option<bool>) -> Option<bool> {
    requested.filter(|&want| want != current)
}

#[cfg(feature = "whisper")]
fn open_context(
    path: &str,
    flash_attn: bool,
    use_gpu: Option<bool>,
) -> Result<WhisperContext, whisper_rs::WhisperError> {
    let mut context_params = WhisperContextParameters::default();
    context_params.flash_attn(flash_attn);
    if let Some(use_gpu) = use_gpu {
        context_params.use_gpu(use_gpu);
    }
    WhisperContext::new_with_params(path, context_params)
}

#[cfg(feature = "whisper")]
struct WhisperEngineContext {
    context: WhisperContext,
    /// Kept so the context can be rebuilt with another compute backend.
    path: String,
    flash_attn: bool,
    /// GPU setting the current context was created with.
    use_gpu: bool,
    model_type: String,
    last_language: Option<String>,
}

#[cfg(feature = "whisper")]
impl WhisperEngineContext {
    /// GPU use is fixed per whisper context, so a different per-call
    /// preference means reloading the weights.
    fn apply_gpu_preference(&mut self, requested: Option<bool>) -> Result<(), EngineError> {
        let Some(use_gpu) = gpu_switch(self.use_gpu, requested) else {
            return Ok(());
        };

        info!(
            "recreating whisper context with GPU {}",
            if use_gpu { "enabled" } else { "disabled" }
        );
        self.context = open_context(&self.path, self.flash_attn, Some(use_gpu)).map_err(|e| {
            warn!("failed to switch GPU preference: {}", e);
            EngineError::Run {
                status: -1,
                message: format!("Failed to recreate Whisper context: {}", e),
            }
        })?;
        self.use_gpu = use_gpu;
        Ok(())
    }
}

#[cfg(feature = "whisper")]
impl EngineContext for WhisperEngineContext {
    fn run(
        &mut self,
        samples: &[f32],
        params: &EngineParams,
    ) -> Result<Vec<RawSegment>, EngineError> {
        self.apply_gpu_preference(params.use_gpu)?;

        let mut state = self.context.create_state().map_err(|e| EngineError::Run {
            status: -1,
            message: format!("Failed to create Whisper state: {}", e),
        })?;

        let mut full_params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        full_params.set_language(params.language.as_deref());
        full_params.set_translate(params.translate);
        if let Some(threads) = params.threads {
            let threads = i32::try_from(threads).map_err(|_| EngineError::Run {
                status: -1,
                message: format!("thread count {threads} exceeds the engine's range"),
            })?;
            full_params.set_n_threads(threads);
        }
        if let Some(prompt) = params.initial_prompt.as_deref() {
            full_params.set_initial_prompt(prompt);
        }

        full_params.set_print_special(false);
        full_params.set_print_progress(false);
        full_params.set_print_realtime(false);
        full_params.set_print_timestamps(false);

        state
            .full(full_params, samples)
            .map_err(|e| EngineError::Run {
                status: -1,
                message: format!("Whisper inference failed: {}", e),
            })?;

        let lang_id = state.full_lang_id_from_state();
        self.last_language = whisper_rs::get_lang_str(lang_id).map(str::to_string);

        // Timestamp and control tokens sort after end-of-text
        let eot = self.context.token_eot();
        let segments = state
            .as_iter()
            .map(|segment| {
                let tokens = (0..segment.n_tokens())
                    .filter_map(|i| segment.get_token(i))
                    .filter(|token| token.token_id() < eot)
                    .map(|token| RawToken {
                        probability: token.token_probability(),
                    })
                    .collect();
                RawSegment {
                    start_ticks: segment.start_timestamp(),
                    end_ticks: segment.end_timestamp(),
                    text: segment.to_string(),
                    tokens,
                    confidence: None,
                }
            })
            .collect();

        Ok(segments)
    }

    fn detected_language(&self) -> Option<String> {
        self.last_language.clone()
    }

    fn model_type(&self) -> String {
        self.model_type.clone()
    }

    fn is_multilingual(&self) -> bool {
        self.context.is_multilingual()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enables_flash_attention() {
        let engine = WhisperEngine::new();
        assert!(engine.flash_attn);
        assert_eq!(engine.use_gpu, None);
        assert_eq!(engine.with_gpu(false).use_gpu, Some(false));
    }

    #[test]
    fn test_gpu_switch_only_when_preference_differs() {
        assert_eq!(gpu_switch(true, None), None);
        assert_eq!(gpu_switch(false, None), None);
        assert_eq!(gpu_switch(true, Some(true)), None);
        assert_eq!(gpu_switch(false, Some(false)), None);
        assert_eq!(gpu_switch(true, Some(false)), Some(false));
        assert_eq!(gpu_switch(false, Some(true)), Some(true));
    }

    #[test]
    fn test_gpu_default_follows_build_features() {
        let gpu_feature =
            cfg!(feature = "cuda") || cfg!(feature = "vulkan") || cfg!(feature = "hipblas");
        assert_eq!(GPU_BUILD, gpu_feature);
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_disabled_engine_reports_unavailable() {
        let result = WhisperEngine::new().init(Path::new("models/ggml-base.bin"));
        assert!(matches!(result, Err(EngineError::Unavailable { .. })));
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_garbage_model_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("ggml-base.bin");
        std::fs::write(&model_path, b"fake model data").unwrap();

        let result = WhisperEngine::new().init(&model_path);
        assert!(matches!(result, Err(EngineError::Init { .. })));
    }
}
