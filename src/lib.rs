//! speechcast - Script-to-speech generation and playback
//!
//! Streams synthesized speech from a generation service, turns raw PCM
//! fragments into playable WAV clips, and plays them back in order.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod generation;
pub mod output;
pub mod playback;
pub mod voices;

// Composition root - needs the CLI types and the remote service
#[cfg(all(feature = "cli", feature = "remote"))]
pub mod app;

// Core traits (service → orchestrator → sink, clips → player)
pub use generation::{GenerationService, GenerationSink};
pub use playback::ClipPlayer;

// Generation
pub use generation::{GenerationHandle, GenerationSettings, Orchestrator};

// Playback
pub use playback::{PlaybackSequencer, PlaybackState, PlaybackUpdate};

// Audio
pub use audio::{EncodedAudio, PcmFormat, transcode_fragment};

// Error handling
pub use error::{Result, SpeechcastError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
