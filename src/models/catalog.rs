//! Whisper model metadata catalog.
//!
//! The standard ggml model family published for whisper.cpp. Only names and
//! approximate sizes are kept; fetching models is left to the user.

/// Metadata for a whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogModel {
    /// Model identifier (e.g., "tiny.en", "base", "large-v3")
    pub name: &'static str,
    /// Approximate file size in megabytes
    pub size_mb: u32,
    /// Whether this model supports English only
    pub english_only: bool,
}

pub const MODELS: &[CatalogModel] = &[
    CatalogModel {
        name: "tiny.en",
        size_mb: 75,
        english_only: true,
    },
    CatalogModel {
        name: "tiny",
        size_mb: 75,
        english_only: false,
    },
    CatalogModel {
        name: "base.en",
        size_mb: 142,
        english_only: true,
    },
    CatalogModel {
        name: "base",
        size_mb: 142,
        english_only: false,
    },
    CatalogModel {
        name: "small.en",
        size_mb: 466,
        english_only: true,
    },
    CatalogModel {
        name: "small",
        size_mb: 466,
        english_only: false,
    },
    CatalogModel {
        name: "medium.en",
        size_mb: 1533,
        english_only: true,
    },
    CatalogModel {
        name: "medium",
        size_mb: 1533,
        english_only: false,
    },
    CatalogModel {
        name: "large-v3",
        size_mb: 3095,
        english_only: false,
    },
];

/// Find a model by exact name.
pub fn get_model(name: &str) -> Option<&'static CatalogModel> {
    MODELS.iter().find(|m| m.name == name)
}

pub fn list_models() -> &'static [CatalogModel] {
    MODELS
}

/// Map shorthand names onto catalog names ("large" means the newest large).
pub fn resolve_name(name: &str) -> &str {
    match name {
        "large" => "large-v3",
        other => other,
    }
}

/// File name whisper.cpp uses for a model.
pub fn file_name(name: &str) -> String {
    format!("ggml-{}.bin", resolve_name(name))
}
