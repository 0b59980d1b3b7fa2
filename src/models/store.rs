//! Locating model files on disk.

use crate::models::catalog;
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory for model files.
///
/// Uses `~/.local/share/transcribo/models/` on Linux.
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("transcribo")
        .join("models")
}

/// Resolve a model argument to a file path.
///
/// Anything that looks like a path (has a separator or ends in `.bin`) is
/// taken as-is; otherwise it is a catalog name looked up in `models_dir`.
pub fn resolve_model(models_dir: &Path, name_or_path: &str) -> PathBuf {
    let looks_like_path = name_or_path.contains(std::path::MAIN_SEPARATOR)
        || name_or_path.contains('/')
        || name_or_path.ends_with(".bin");
    if looks_like_path {
        PathBuf::from(name_or_path)
    } else {
        models_dir.join(catalog::file_name(name_or_path))
    }
}

/// Names of every `ggml-*.bin` file in `models_dir`, sorted.
pub fn list_installed(models_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(models_dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let file_name = entry.file_name();
            let model = file_name
                .to_str()?
                .strip_prefix("ggml-")?
                .strip_suffix(".bin")?
                .to_string();
            entry.path().is_file().then_some(model)
        })
        .collect();

    names.sort();
    names
}

pub fn is_installed(models_dir: &Path, name: &str) -> bool {
    resolve_model(models_dir, name).is_file()
}

/// One line of the `models` listing.
pub fn format_model_info(model: &catalog::CatalogModel, installed: bool) -> String {
    let status = if installed { "[installed]" } else { "" };
    let scope = if model.english_only {
        "english"
    } else {
        "multilingual"
    };
    format!(
        "{:12} {:5} MB   {:12} {}",
        model.name, model.size_mb, scope, status
    )
    .trim_end()
    .to_string()
}
