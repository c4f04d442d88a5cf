//! Default configuration constants for speechcast.
//!
//! Shared by the config layer, the orchestrator and the CLI so that every
//! entry point agrees on the same limits and identities.

/// Maximum script length in characters.
///
/// Scripts longer than this are rejected before any request is issued.
pub const MAX_SCRIPT_LENGTH: usize = 5000;

/// Voice substituted after a single-speaker attempt fails.
pub const FALLBACK_VOICE: &str = "Zephyr";

/// Voice used when neither the config nor the CLI selects one.
pub const DEFAULT_VOICE: &str = "Puck";

/// Default generative speech model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-tts";

/// Default service endpoint (API version root).
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the service API key.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Secondary API key variable, checked when the configured one is unset.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Request timeout for the generation service, in seconds.
///
/// Long scripts stream for minutes; this only bounds a stalled transport.
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Speaker tags recognized in multi-speaker scripts, with their default voices.
pub const RECOGNIZED_SPEAKERS: &[(&str, &str)] = &[("Speaker1", "Puck"), ("Speaker2", "Kore")];

/// MIME prefix signalling raw linear PCM with an explicit bit depth.
pub const RAW_PCM_MIME_PREFIX: &str = "audio/L";

/// Tag attached to clips that were wrapped in a WAV container.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Prefix for generated clip display names.
pub const CLIP_NAME_PREFIX: &str = "audio_chunk_";

/// Status rendered once a generation is triggered.
pub const STATUS_INITIALIZING: &str = "Initializing audio generation...";

/// Message surfaced when autoplay cannot start a clip.
pub const AUTOPLAY_BLOCKED_MESSAGE: &str =
    "Audio autoplay was blocked. Please press play manually.";
