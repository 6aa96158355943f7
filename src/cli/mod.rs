//! CLI definitions for the `farmguide` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FarmGuide CLI
#[derive(Parser, Debug)]
#[command(name = "farmguide", version, about = "Multilingual assistant for farmers")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML config file (defaults to $FARMGUIDE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Ask one question and print the answer
    Ask(AskArgs),
    /// Transcribe an audio file
    Transcribe(TranscribeArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides config)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Text read from a product label
    #[arg(long, default_value = "")]
    pub ocr_text: String,

    /// Answer language: en, ur or sd
    #[arg(short, long)]
    pub language: Option<String>,

    /// Session id for follow-up questions
    #[arg(short, long)]
    pub session: Option<String>,

    /// The farmer's question
    pub query: String,
}

#[derive(Parser, Debug)]
pub struct TranscribeArgs {
    /// Spoken language hint
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Audio file (wav, mp3, m4a, ogg, webm, flac)
    pub file: PathBuf,
}

/// MIME type for an audio file, from its extension.
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "audio/wav",
    }
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
