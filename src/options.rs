//! Per-call transcription options.
//!
//! Options arrive either already typed (from Rust callers and the config
//! file) or as a loosely-typed host value (`serde_json::Value`) from an
//! embedding layer. Both paths end in [`TranscriptionOptions::validate`], so
//! nothing malformed ever reaches the engine.

use crate::defaults;
use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language codes accepted by whisper models.
pub const LANGUAGES: &[&str] = &[
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", "pl", "ca", "nl", "ar", "sv",
    "it", "id", "hi", "fi", "vi", "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no",
    "th", "ur", "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", "te", "fa", "lv", "bn", "sr",
    "az", "sl", "kn", "et", "mk", "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw",
    "gl", "mr", "pa", "si", "km", "sn", "yo", "so", "af", "oc", "ka", "be", "tg", "sd", "gu",
    "am", "yi", "lo", "uz", "fo", "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl",
    "mg", "as", "tt", "haw", "ln", "ha", "ba", "jw", "su", "yue",
];

/// Options for one `transcribe` call. Unset fields use engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranscriptionOptions {
    /// ISO code, or "auto" / unset for detection.
    pub language: Option<String>,
    pub translate: bool,
    pub threads: Option<u32>,
    pub initial_prompt: Option<String>,
    #[serde(rename = "useGPU", alias = "useGpu")]
    pub use_gpu: Option<bool>,
}

impl TranscriptionOptions {
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_initial_prompt(mut self, prompt: &str) -> Self {
        self.initial_prompt = Some(prompt.to_string());
        self
    }

    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = Some(use_gpu);
        self
    }

    /// Parse options from a host value, rejecting wrong types per key.
    ///
    /// `null` for any key means unset. Unknown keys are ignored, matching
    /// how the host layer passes through unrelated fields.
    pub fn from_value(value: &Value) -> Result<Self, OptionsError> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(OptionsError::new(
                    "options",
                    format!("expected an object, got {}", type_name(other)),
                ));
            }
        };

        let options = Self {
            language: optional_string(object.get("language"), "language")?,
            translate: optional_bool(object.get("translate"), "translate")?.unwrap_or(false),
            threads: optional_threads(object.get("threads"))?,
            initial_prompt: optional_string(object.get("initialPrompt"), "initialPrompt")?,
            use_gpu: optional_bool(object.get("useGPU"), "useGPU")?,
        };
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| OptionsError::new("options", format!("malformed JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Check value ranges and language codes.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(threads) = self.threads
            && (threads == 0 || i32::try_from(threads).is_err())
        {
            return Err(OptionsError::new(
                "threads",
                format!("must be between 1 and {}, got {threads}", i32::MAX),
            ));
        }
        if let Some(language) = &self.language {
            let code = language.trim().to_ascii_lowercase();
            if code.is_empty() {
                return Err(OptionsError::new("language", "must not be empty"));
            }
            if code != defaults::AUTO_LANGUAGE && !LANGUAGES.contains(&code.as_str()) {
                return Err(OptionsError::new(
                    "language",
                    format!("unsupported language code '{language}'"),
                ));
            }
        }
        Ok(())
    }

    /// The forced language, normalised, or `None` for auto-detection.
    pub fn forced_language(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| l != defaults::AUTO_LANGUAGE)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn optional_string(value: Option<&Value>, key: &str) -> Result<Option<String>, OptionsError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(OptionsError::new(
            key,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

fn optional_bool(value: Option<&Value>, key: &str) -> Result<Option<bool>, OptionsError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(OptionsError::new(
            key,
            format!("expected a boolean, got {}", type_name(other)),
        )),
    }
}

fn optional_threads(value: Option<&Value>) -> Result<Option<u32>, OptionsError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|&t| t > 0)
            .and_then(|t| u32::try_from(t).ok())
            .map(Some)
            .ok_or_else(|| OptionsError::new("threads", format!("expected a positive integer, got {n}"))),
        Some(other) => Err(OptionsError::new(
            "threads",
            format!("expected a positive integer, got {}", type_name(other)),
        )),
    }
}
