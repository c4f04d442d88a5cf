//! Error types for speechcast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechcastError {
    // Input validation errors (never retried)
    #[error("{message}")]
    Validation { message: String },

    // Fragment errors
    #[error("Invalid audio MIME type '{mime_type}': {message}")]
    Format { mime_type: String, message: String },

    #[error("Failed to decode audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    // Generation service errors
    #[error("Generation request failed: {message}")]
    Transport { message: String },

    // Local playback errors
    #[error("Playback failed: {message}")]
    Playback { message: String },

    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SpeechcastError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SpeechcastError>;
