use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use transcribo::audio::wav::load_wav;
use transcribo::cli::{Cli, Commands};
use transcribo::config::Config;
use transcribo::models::catalog::list_models;
use transcribo::models::store::{
    default_models_dir, format_model_info, is_installed, list_installed, resolve_model,
};
use transcribo::output::{OutputFormat, render};
use transcribo::stt::progress::ProgressSink;
use transcribo::{Transcriber, TranscriptionOptions, WhisperEngine, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Transcribe {
            audio,
            model,
            language,
            translate,
            threads,
            prompt,
            no_gpu,
            format,
            chunk_secs,
            progress,
        } => {
            let mut config = config;
            if let Some(language) = language {
                config.transcription.language = language;
            }
            if translate {
                config.transcription.translate = true;
            }
            if threads.is_some() {
                config.transcription.threads = threads;
            }
            if prompt.is_some() {
                config.transcription.initial_prompt = prompt;
            }
            if no_gpu {
                config.transcription.use_gpu = Some(false);
            }
            if let Some(chunk_secs) = chunk_secs {
                config.transcription.chunk_secs = chunk_secs;
            }
            config.validate()?;

            let format = format.unwrap_or(config.output.format);
            handle_transcribe(&config, &audio, model.as_deref(), format, progress).await?;
        }
        Commands::Models => {
            handle_models(&config);
        }
        Commands::Info { model } => {
            handle_info(&config, model.as_deref()).await?;
        }
    }

    Ok(())
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // Load from custom path
        Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else if let Some(default_path) = Config::default_path() {
        // Try default path, fall back to defaults
        Config::load_or_default(&default_path)?
    } else {
        Config::default()
    };

    // Apply environment variable overrides
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Model file from `--model`, or from the config.
fn model_path(config: &Config, model: Option<&str>) -> PathBuf {
    match model {
        Some(name_or_path) => {
            let dir = config.model.dir.clone().unwrap_or_else(default_models_dir);
            resolve_model(&dir, name_or_path)
        }
        None => config.model_path(),
    }
}

fn new_transcriber(config: &Config) -> Result<Arc<Transcriber>> {
    let mut engine = WhisperEngine::new();
    if let Some(use_gpu) = config.transcription.use_gpu {
        engine = engine.with_gpu(use_gpu);
    }
    let transcriber = Transcriber::new(Arc::new(engine), config.transcriber_config())?;
    Ok(Arc::new(transcriber))
}

async fn handle_transcribe(
    config: &Config,
    audio: &Path,
    model: Option<&str>,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let decoded =
        load_wav(audio).with_context(|| format!("Failed to read {}", audio.display()))?;
    tracing::info!(
        "decoded {} ({} Hz, {} channel(s), {:.1}s)",
        audio.display(),
        decoded.source_rate,
        decoded.source_channels,
        decoded.duration_secs()
    );

    let transcriber = new_transcriber(config)?;
    let path = model_path(config, model);
    transcriber
        .load_async(path.clone())
        .await
        .with_context(|| format!("Failed to load model {}", path.display()))?;

    let options: TranscriptionOptions = config.to_options();
    let progress: Option<Box<dyn ProgressSink + Send>> = if show_progress {
        Some(Box::new(|fraction: f32| {
            eprint!("\r\x1b[2KTranscribing... {:3.0}%", fraction * 100.0);
            if fraction >= 1.0 {
                eprintln!();
            }
        }))
    } else {
        None
    };

    let result = transcriber
        .transcribe_async(decoded.samples, options, progress, None)
        .await?;
    transcriber.release()?;

    print!("{}", render(&result, format)?);
    Ok(())
}

fn handle_models(config: &Config) {
    let dir = config.model.dir.clone().unwrap_or_else(default_models_dir);

    println!("Available models ({}):", dir.display());
    for model in list_models() {
        println!("  {}", format_model_info(model, is_installed(&dir, model.name)));
    }

    // Files that are not in the catalog (fine-tunes, quantized variants)
    let extras: Vec<String> = list_installed(&dir)
        .into_iter()
        .filter(|name| list_models().iter().all(|m| m.name != name.as_str()))
        .collect();
    if !extras.is_empty() {
        println!();
        println!("Other installed models:");
        for name in extras {
            println!("  {name}");
        }
    }
}

async fn handle_info(config: &Config, model: Option<&str>) -> Result<()> {
    println!("transcribo {}", transcribo::version_string());
    println!("Backend: {}", transcribo::defaults::gpu_backend());

    let transcriber = new_transcriber(config)?;
    let path = model_path(config, model);
    transcriber
        .load_async(path.clone())
        .await
        .with_context(|| format!("Failed to load model {}", path.display()))?;

    let info = transcriber.info()?;
    println!("Model: {}", info.model_path);
    if let Some(model_type) = info.model_type {
        println!("Type: {model_type}");
    }
    if let Some(multilingual) = info.multilingual {
        println!("Multilingual: {}", if multilingual { "yes" } else { "no" });
    }

    transcriber.release()?;
    Ok(())
}
