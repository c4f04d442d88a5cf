//! Command-line interface for speechcast
//!
//! Provides argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Turn scripts into speech
#[derive(Parser, Debug)]
#[command(name = "speechcast", version, about = "Turn scripts into speech")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a timeout string.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Parse a `TAG=VOICE` speaker assignment.
fn parse_speaker(s: &str) -> Result<(String, String), String> {
    let (tag, voice) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=VOICE, got '{s}'"))?;
    let (tag, voice) = (tag.trim(), voice.trim());
    if tag.is_empty() || voice.is_empty() {
        return Err(format!("expected TAG=VOICE, got '{s}'"));
    }
    Ok((tag.to_string(), voice.to_string()))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate speech from a script
    Generate(GenerateArgs),

    /// List the prebuilt voices
    Voices,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Script file, or `-` for stdin
    #[arg(value_name = "SCRIPT_FILE", conflicts_with = "text")]
    pub script_file: Option<PathBuf>,

    /// Script text given inline
    #[arg(long, short = 't', value_name = "TEXT")]
    pub text: Option<String>,

    /// Voice for single-speaker scripts (default from config)
    #[arg(long, value_name = "VOICE")]
    pub voice: Option<String>,

    /// Speech model override
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Speaker assignment for multi-speaker scripts, repeatable (e.g. Host=Puck)
    #[arg(long = "speaker", value_name = "TAG=VOICE", value_parser = parse_speaker)]
    pub speakers: Vec<(String, String)>,

    /// Force multi-speaker mode with the configured speakers
    #[arg(long)]
    pub multi_speaker: bool,

    /// Write clips to this directory when generation finishes
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Do not play clips
    #[arg(long)]
    pub no_play: bool,

    /// Request timeout (default from config). Examples: 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Get a configuration value by key (e.g., generation.voice)
    Get {
        /// Dotted key path (e.g., generation.voice, speakers.Speaker1)
        key: String,
    },
    /// Dump a commented configuration template
    Dump,
}
