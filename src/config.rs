use crate::defaults;
use crate::models::{catalog, store};
use crate::options::TranscriptionOptions;
use crate::output::OutputFormat;
use crate::stt::transcriber::TranscriberConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub transcription: TranscriptionConfig,
    pub output: OutputConfig,
}

/// Which model to load
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Catalog name, e.g. "base" or "small.en"
    pub name: String,
    /// Explicit model file; wins over `name`
    pub path: Option<PathBuf>,
    /// Directory searched for catalog names
    pub dir: Option<PathBuf>,
}

/// Defaults for every transcription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub language: String,
    pub translate: bool,
    pub threads: Option<u32>,
    pub initial_prompt: Option<String>,
    pub use_gpu: Option<bool>,
    pub chunk_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: defaults::DEFAULT_MODEL.to_string(),
            path: None,
            dir: None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            translate: false,
            threads: None,
            initial_prompt: None,
            use_gpu: None,
            chunk_secs: defaults::CHUNK_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML or invalid values.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TRANSCRIBO_MODEL → model.name
    /// - TRANSCRIBO_MODEL_DIR → model.dir
    /// - TRANSCRIBO_LANGUAGE → transcription.language
    /// - TRANSCRIBO_THREADS → transcription.threads (ignored unless a number)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("TRANSCRIBO_MODEL")
            && !model.is_empty()
        {
            self.model.name = model;
        }

        if let Ok(dir) = std::env::var("TRANSCRIBO_MODEL_DIR")
            && !dir.is_empty()
        {
            self.model.dir = Some(PathBuf::from(dir));
        }

        if let Ok(language) = std::env::var("TRANSCRIBO_LANGUAGE")
            && !language.is_empty()
        {
            self.transcription.language = language;
        }

        if let Ok(threads) = std::env::var("TRANSCRIBO_THREADS")
            && let Ok(threads) = threads.trim().parse::<u32>()
        {
            self.transcription.threads = Some(threads);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/transcribo/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("transcribo").join("config.toml"))
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.transcriber_config().validate()?;
        self.to_options().validate()?;
        Ok(())
    }

    /// Model file to load: `model.path` if set, otherwise `model.name`
    /// resolved in the model directory.
    pub fn model_path(&self) -> PathBuf {
        if let Some(path) = &self.model.path {
            return path.clone();
        }
        let dir = self
            .model
            .dir
            .clone()
            .unwrap_or_else(store::default_models_dir);
        store::resolve_model(&dir, catalog::resolve_name(&self.model.name))
    }

    pub fn to_options(&self) -> TranscriptionOptions {
        let t = &self.transcription;
        TranscriptionOptions {
            language: Some(t.language.clone()),
            translate: t.translate,
            threads: t.threads,
            initial_prompt: t.initial_prompt.clone(),
            use_gpu: t.use_gpu,
        }
    }

    pub fn transcriber_config(&self) -> TranscriberConfig {
        TranscriberConfig {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_secs: self.transcription.chunk_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_transcribo_env() {
        remove_env("TRANSCRIBO_MODEL");
        remove_env("TRANSCRIBO_MODEL_DIR");
        remove_env("TRANSCRIBO_LANGUAGE");
        remove_env("TRANSCRIBO_THREADS");
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.model.name, "base");
        assert_eq!(config.model.path, None);
        assert_eq!(config.transcription.language, "auto");
        assert!(!config.transcription.translate);
        assert_eq!(config.transcription.threads, None);
        assert_eq!(config.transcription.chunk_secs, 30.0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_config(
            r#"
            [model]
            name = "small.en"
            dir = "/srv/models"

            [transcription]
            language = "en"
            translate = true
            threads = 6
            initial_prompt = "Glossary: Kubernetes"
            use_gpu = false
            chunk_secs = 20.0

            [output]
            format = "srt"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.model.name, "small.en");
        assert_eq!(config.model.dir, Some(PathBuf::from("/srv/models")));
        assert_eq!(config.transcription.language, "en");
        assert!(config.transcription.translate);
        assert_eq!(config.transcription.threads, Some(6));
        assert_eq!(
            config.transcription.initial_prompt.as_deref(),
            Some("Glossary: Kubernetes")
        );
        assert_eq!(config.transcription.use_gpu, Some(false));
        assert_eq!(config.transcription.chunk_secs, 20.0);
        assert_eq!(config.output.format, OutputFormat::Srt);
        assert_eq!(
            config.model_path(),
            PathBuf::from("/srv/models/ggml-small.en.bin")
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_config(
            r#"
            [transcription]
            language = "de"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.transcription.language, "de");
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(config.transcription.chunk_secs, 30.0);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_explicit_model_path_wins() {
        let config = Config {
            model: ModelConfig {
                name: "tiny".into(),
                path: Some(PathBuf::from("/opt/custom.bin")),
                dir: Some(PathBuf::from("/srv/models")),
            },
            ..Config::default()
        };
        assert_eq!(config.model_path(), PathBuf::from("/opt/custom.bin"));
    }

    #[test]
    fn test_large_alias_resolves_in_model_dir() {
        let mut config = Config::default();
        config.model.name = "large".into();
        config.model.dir = Some(PathBuf::from("/m"));
        assert_eq!(config.model_path(), PathBuf::from("/m/ggml-large-v3.bin"));
    }

    #[test]
    fn test_invalid_chunk_secs_rejected() {
        let temp_file = write_config(
            r#"
            [transcription]
            chunk_secs = 0.0
        "#,
        );
        let err = Config::load(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("chunk_secs"));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let temp_file = write_config(
            r#"
            [transcription]
            language = "klingon"
        "#,
        );
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        let temp_file = write_config(
            r#"
            [output]
            format = "docx"
        "#,
        );
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_to_options_and_transcriber_config() {
        let mut config = Config::default();
        config.transcription.language = "fr".into();
        config.transcription.threads = Some(2);
        config.transcription.chunk_secs = 10.0;

        let options = config.to_options();
        assert_eq!(options.language.as_deref(), Some("fr"));
        assert_eq!(options.threads, Some(2));
        assert_eq!(options.forced_language().as_deref(), Some("fr"));

        let transcriber = config.transcriber_config();
        assert_eq!(transcriber.sample_rate, 16000);
        assert_eq!(transcriber.chunk_secs, 10.0);
    }

    #[test]
    fn test_env_override_model() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_transcribo_env();

        set_env("TRANSCRIBO_MODEL", "tiny.en");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.model.name, "tiny.en");
        assert_eq!(config.transcription.language, "auto"); // Not overridden

        clear_transcribo_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_transcribo_env();

        set_env("TRANSCRIBO_MODEL", "medium");
        set_env("TRANSCRIBO_MODEL_DIR", "/data/models");
        set_env("TRANSCRIBO_LANGUAGE", "es");
        set_env("TRANSCRIBO_THREADS", "3");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.model.name, "medium");
        assert_eq!(config.model.dir, Some(PathBuf::from("/data/models")));
        assert_eq!(config.transcription.language, "es");
        assert_eq!(config.transcription.threads, Some(3));

        clear_transcribo_env();
    }

    #[test]
    fn test_env_override_empty_and_garbage_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_transcribo_env();

        set_env("TRANSCRIBO_MODEL", "");
        set_env("TRANSCRIBO_THREADS", "four");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.model.name, "base");
        assert_eq!(config.transcription.threads, None);

        clear_transcribo_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_config(
            r#"
            [model
            name = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_is_namespaced() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("transcribo/config.toml"));
        }
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_transcribo_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }
}
