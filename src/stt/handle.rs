//! Lifetime of one loaded model.
//!
//! State machine:
//!
//! ```text
//! Unloaded --load ok--> Loaded --load ok--> Loaded (old context freed first)
//! Loaded --release--> Unloaded
//! Loaded --load fails--> Unloaded
//! ```
//!
//! The engine context is an owned `Box<dyn EngineContext>`; freeing it is
//! dropping it, so a context can be neither freed twice nor used after
//! release.

use crate::engine::{EngineContext, SpeechEngine};
use crate::error::LoadError;
use crate::stt::types::ModelInfo;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns at most one live engine context.
pub struct ModelHandle {
    engine: Arc<dyn SpeechEngine>,
    context: Option<Box<dyn EngineContext>>,
    /// Last successfully loaded path; survives `release` for `reload`.
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("engine", &self.engine.name())
            .field("loaded", &self.is_loaded())
            .field("path", &self.path)
            .finish()
    }
}

impl ModelHandle {
    /// Create an empty (unloaded) handle.
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            context: None,
            path: None,
        }
    }

    /// Load a model, replacing any loaded one.
    ///
    /// The previous context is freed before the new one is initialised, so
    /// there is never more than one live context per handle. On any failure
    /// the handle is left unloaded.
    pub fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        self.release();

        if let Err(e) = check_readable(path) {
            warn!("model path {} is not readable: {}", path.display(), e);
            return Err(LoadError::InvalidPath {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }

        let context = self.engine.init(path).map_err(|source| {
            warn!("engine rejected model {}: {}", path.display(), source);
            LoadError::EngineInitFailed {
                path: path.display().to_string(),
                source,
            }
        })?;

        info!(
            "loaded {} model from {} (engine: {})",
            context.model_type(),
            path.display(),
            self.engine.name()
        );
        self.context = Some(context);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Load the last successfully loaded path again.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let path = self.path.clone().ok_or(LoadError::NothingToReload)?;
        self.load(&path)
    }

    /// Free the engine context. Idempotent.
    pub fn release(&mut self) {
        if let Some(context) = self.context.take() {
            debug!("releasing {} model", context.model_type());
            drop(context);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.context.is_some()
    }

    /// Last successfully loaded path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn engine(&self) -> &Arc<dyn SpeechEngine> {
        &self.engine
    }

    /// The live context, if loaded.
    pub fn context_mut(&mut self) -> Option<&mut (dyn EngineContext + 'static)> {
        self.context.as_deref_mut()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            loaded: self.is_loaded(),
            model_path: self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            model_type: self.context.as_ref().map(|c| c.model_type()),
            multilingual: self.context.as_ref().map(|c| c.is_multilingual()),
        }
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// The model must be a regular file we can open.
fn check_readable(path: &Path) -> std::io::Result<()> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    File::open(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use tempfile::TempDir;

    fn model_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"weights").unwrap();
        path
    }

    #[test]
    fn new_handle_is_unloaded() {
        let handle = ModelHandle::new(Arc::new(MockEngine::new()));
        assert!(!handle.is_loaded());
        assert_eq!(handle.path(), None);
    }

    #[test]
    fn load_then_release() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut handle = ModelHandle::new(Arc::new(engine.clone()));

        handle.load(&model_file(&dir, "ggml-base.bin")).unwrap();
        assert!(handle.is_loaded());
        assert_eq!(engine.live_contexts(), 1);

        handle.release();
        assert!(!handle.is_loaded());
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn double_release_is_noop() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut handle = ModelHandle::new(Arc::new(engine.clone()));
        handle.load(&model_file(&dir, "m.bin")).unwrap();

        handle.release();
        handle.release();
        assert!(!handle.is_loaded());
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn release_on_fresh_handle_is_noop() {
        let mut handle = ModelHandle::new(Arc::new(MockEngine::new()));
        handle.release();
        assert!(!handle.is_loaded());
    }

    #[test]
    fn reload_replaces_without_leaking() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut handle = ModelHandle::new(Arc::new(engine.clone()));

        handle.load(&model_file(&dir, "ggml-tiny.bin")).unwrap();
        handle.load(&model_file(&dir, "ggml-base.bin")).unwrap();

        assert_eq!(engine.live_contexts(), 1);
        assert_eq!(handle.info().model_type.as_deref(), Some("base"));
    }

    #[test]
    fn missing_file_is_invalid_path_and_unloads() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut handle = ModelHandle::new(Arc::new(engine.clone()));
        handle.load(&model_file(&dir, "m.bin")).unwrap();

        let result = handle.load(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(LoadError::InvalidPath { .. })));
        assert!(!handle.is_loaded());
        assert_eq!(engine.live_contexts(), 0);
    }

    #[test]
    fn directory_is_invalid_path() {
        let dir = TempDir::new().unwrap();
        let mut handle = ModelHandle::new(Arc::new(MockEngine::new()));
        let result = handle.load(dir.path());
        assert!(matches!(result, Err(LoadError::InvalidPath { .. })));
    }

    #[test]
    fn engine_rejection_is_init_failure_and_unloads() {
        let dir = TempDir::new().unwrap();
        let mut handle = ModelHandle::new(Arc::new(MockEngine::new().rejecting_models()));

        let result = handle.load(&model_file(&dir, "m.bin"));
        assert!(matches!(result, Err(LoadError::EngineInitFailed { .. })));
        assert!(!handle.is_loaded());
    }

    #[test]
    fn failed_load_keeps_last_good_path_for_diagnostics() {
        let dir = TempDir::new().unwrap();
        let good = model_file(&dir, "good.bin");
        let mut handle = ModelHandle::new(Arc::new(MockEngine::new()));

        handle.load(&good).unwrap();
        assert!(handle.load(&dir.path().join("missing.bin")).is_err());

        let info = handle.info();
        assert!(!info.loaded);
        assert_eq!(info.model_path, good.display().to_string());
        assert_eq!(info.model_type, None);
    }

    #[test]
    fn reload_uses_last_path() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let path = model_file(&dir, "m.bin");
        let mut handle = ModelHandle::new(Arc::new(engine.clone()));

        assert!(matches!(handle.reload(), Err(LoadError::NothingToReload)));

        handle.load(&path).unwrap();
        handle.release();
        handle.reload().unwrap();

        assert!(handle.is_loaded());
        assert_eq!(engine.loads(), vec![path.clone(), path]);
    }

    #[test]
    fn drop_frees_context() {
        let dir = TempDir::new().unwrap();
        let engine = MockEngine::new();
        {
            let mut handle = ModelHandle::new(Arc::new(engine.clone()));
            handle.load(&model_file(&dir, "m.bin")).unwrap();
            assert_eq!(engine.live_contexts(), 1);
        }
        assert_eq!(engine.live_contexts(), 0);
    }
}
