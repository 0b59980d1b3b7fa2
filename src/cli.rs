//! Command-line interface for transcribo
//!
//! Provides argument parsing using clap derive macros.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Transcribe audio files with whisper.cpp
#[derive(Parser, Debug)]
#[command(
    name = "transcribo",
    version,
    about = "Transcribe audio files with whisper.cpp"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a WAV file
    Transcribe {
        /// WAV file to transcribe (any rate and channel count)
        #[arg(value_name = "FILE")]
        audio: PathBuf,

        /// Model name (e.g., base, small.en) or path to a ggml model file
        #[arg(long, short = 'm', value_name = "MODEL")]
        model: Option<String>,

        /// Language code (default: auto-detect). Examples: auto, en, de, es, fr
        #[arg(long, short = 'l', value_name = "LANG")]
        language: Option<String>,

        /// Translate the transcript to English
        #[arg(long)]
        translate: bool,

        /// Number of CPU threads for inference (default: engine choice)
        #[arg(long, short = 't', value_name = "N")]
        threads: Option<u32>,

        /// Text that primes the decoder (names, vocabulary)
        #[arg(long, value_name = "TEXT")]
        prompt: Option<String>,

        /// Run inference on the CPU only
        #[arg(long)]
        no_gpu: bool,

        /// Output format: text, srt, vtt or json
        #[arg(long, short = 'f', value_name = "FORMAT")]
        format: Option<OutputFormat>,

        /// Chunk duration in seconds
        #[arg(long, value_name = "SECONDS")]
        chunk_secs: Option<f64>,

        /// Show progress on stderr
        #[arg(long, short = 'p')]
        progress: bool,
    },

    /// List whisper models and which are installed
    Models,

    /// Load a model and print what the engine reports about it
    Info {
        /// Model name or path to a ggml model file
        #[arg(long, short = 'm', value_name = "MODEL")]
        model: Option<String>,
    },
}
