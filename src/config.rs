use crate::defaults;
use crate::error::{Result, SpeechcastError};
use crate::voices::is_valid_tag_token;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    /// Multi-speaker tag -> prebuilt voice. The keys are the recognized speakers.
    pub speakers: SpeakersConfig,
    pub service: ServiceConfig,
    pub playback: PlaybackConfig,
}

/// Model and voice selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub voice: String,
    pub fallback_voice: String,
    pub max_script_length: usize,
}

/// Speaker tag to voice mapping for multi-speaker scripts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SpeakersConfig(pub BTreeMap<String, String>);

/// Remote generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

/// Playback and export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            voice: defaults::DEFAULT_VOICE.to_string(),
            fallback_voice: defaults::FALLBACK_VOICE.to_string(),
            max_script_length: defaults::MAX_SCRIPT_LENGTH,
        }
    }
}

impl Default for SpeakersConfig {
    fn default() -> Self {
        Self(
            defaults::RECOGNIZED_SPEAKERS
                .iter()
                .map(|(tag, voice)| (tag.to_string(), voice.to_string()))
                .collect(),
        )
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DEFAULT_ENDPOINT.to_string(),
            api_key_env: defaults::DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            output_dir: None,
        }
    }
}

impl SpeakersConfig {
    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn tags(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

impl ServiceConfig {
    /// Read the API key from `api_key_env`, then from `API_KEY`.
    ///
    /// # Errors
    /// Returns `ConfigInvalidValue` when neither variable is set.
    pub fn api_key(&self) -> Result<String> {
        [self.api_key_env.as_str(), defaults::FALLBACK_API_KEY_ENV]
            .iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| SpeechcastError::ConfigInvalidValue {
                key: "service.api_key_env".to_string(),
                message: format!(
                    "no API key found; set {} (or {})",
                    self.api_key_env,
                    defaults::FALLBACK_API_KEY_ENV
                ),
            })
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechcastError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SpeechcastError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SpeechcastError::ConfigFileNotFound { path }) => {
                tracing::debug!(path = %path, "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SPEECHCAST_MODEL → generation.model
    /// - SPEECHCAST_VOICE → generation.voice
    /// - SPEECHCAST_FALLBACK_VOICE → generation.fallback_voice
    /// - SPEECHCAST_ENDPOINT → service.endpoint
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SPEECHCAST_MODEL")
            && !model.is_empty()
        {
            self.generation.model = model;
        }

        if let Ok(voice) = std::env::var("SPEECHCAST_VOICE")
            && !voice.is_empty()
        {
            self.generation.voice = voice;
        }

        if let Ok(voice) = std::env::var("SPEECHCAST_FALLBACK_VOICE")
            && !voice.is_empty()
        {
            self.generation.fallback_voice = voice;
        }

        if let Ok(endpoint) = std::env::var("SPEECHCAST_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.service.endpoint = endpoint;
        }

        self
    }

    /// Reject values the generation pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_script_length == 0 {
            return Err(SpeechcastError::ConfigInvalidValue {
                key: "generation.max_script_length".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.generation.fallback_voice.trim().is_empty() {
            return Err(SpeechcastError::ConfigInvalidValue {
                key: "generation.fallback_voice".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if let Some(tag) = self.speakers.0.keys().find(|tag| !is_valid_tag_token(tag)) {
            return Err(SpeechcastError::ConfigInvalidValue {
                key: format!("speakers.{tag}"),
                message: "speaker tags must be a single word of ASCII letters, digits or '_'"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Look up a value by dotted path, e.g. `generation.voice`.
    ///
    /// Scalars are returned bare; tables are rendered as TOML.
    pub fn get_value_by_path(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self)
            .map_err(|e| SpeechcastError::ConfigParse {
                message: e.to_string(),
            })?;

        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| SpeechcastError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "no such configuration key".to_string(),
                })?;
        }

        Ok(match current {
            toml::Value::String(s) => s.clone(),
            toml::Value::Table(table) => toml::to_string(table).map_err(|e| {
                SpeechcastError::ConfigParse {
                    message: e.to_string(),
                }
            })?,
            other => other.to_string(),
        })
    }

    /// Commented template with every option at its default.
    pub fn dump_template() -> String {
        format!(
            r#"# speechcast configuration
# Location: {path}

[generation]
# Speech model used for generation
model = "{model}"
# Voice for single-speaker scripts (see `speechcast voices`)
voice = "{voice}"
# Voice retried once when a single-speaker generation fails
fallback_voice = "{fallback}"
# Longest accepted script, in characters
max_script_length = {max}

[speakers]
# Multi-speaker tag -> voice. A line "Speaker1: ..." is spoken by that voice.
Speaker1 = "Puck"
Speaker2 = "Kore"

[service]
endpoint = "{endpoint}"
# Environment variable holding the API key (API_KEY is tried next)
api_key_env = "{key_env}"
request_timeout_secs = {timeout}

[playback]
# Play clips as they arrive
autoplay = true
# Write clips here after generation
# output_dir = "clips"
"#,
            path = Self::default_path().display(),
            model = defaults::DEFAULT_MODEL,
            voice = defaults::DEFAULT_VOICE,
            fallback = defaults::FALLBACK_VOICE,
            max = defaults::MAX_SCRIPT_LENGTH,
            endpoint = defaults::DEFAULT_ENDPOINT,
            key_env = defaults::DEFAULT_API_KEY_ENV,
            timeout = defaults::REQUEST_TIMEOUT_SECS,
        )
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/speechcast/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("speechcast")
            .join("config.toml")
    }
}
