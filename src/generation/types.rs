//! Data types shared by the generation service, orchestrator and observers.

use crate::audio::EncodedAudio;
use crate::defaults::CLIP_NAME_PREFIX;
use std::collections::BTreeMap;

/// Inline audio carried by a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAudio {
    pub data: String,
    pub mime_type: String,
}

/// One unit of the service's streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub inline_audio: Option<InlineAudio>,
}

impl Fragment {
    pub fn audio(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            inline_audio: Some(InlineAudio {
                data: data.into(),
                mime_type: mime_type.into(),
            }),
        }
    }

    /// A fragment without inline audio (text, metadata, usage reports).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inline audio with both a payload and a MIME tag, if present.
    pub fn playable_audio(&self) -> Option<&InlineAudio> {
        self.inline_audio
            .as_ref()
            .filter(|inline| !inline.data.is_empty() && !inline.mime_type.is_empty())
    }
}

/// A transcoded clip, ordered within one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub display_name: String,
    pub sequence_index: usize,
    pub audio: EncodedAudio,
}

impl AudioClip {
    pub fn new(sequence_index: usize, audio: EncodedAudio) -> Self {
        let display_name = format!(
            "{}{}.{}",
            CLIP_NAME_PREFIX,
            sequence_index,
            audio.file_extension()
        );
        Self {
            display_name,
            sequence_index,
            audio,
        }
    }
}

/// Speaker-to-voice assignment for one multi-speaker tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice: String,
}

/// Which voices the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    Single(String),
    MultiSpeaker(Vec<SpeakerVoice>),
}

impl VoiceSelection {
    pub fn single(voice: impl Into<String>) -> Self {
        Self::Single(voice.into())
    }

    /// Build a multi-speaker selection from a tag -> voice map.
    pub fn multi_speaker_from(speakers: &BTreeMap<String, String>) -> Self {
        Self::MultiSpeaker(
            speakers
                .iter()
                .map(|(speaker, voice)| SpeakerVoice {
                    speaker: speaker.clone(),
                    voice: voice.clone(),
                })
                .collect(),
        )
    }

    /// Speaker tags accepted in the script for this selection.
    pub fn recognized_speakers(&self) -> Vec<&str> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::MultiSpeaker(speakers) => speakers.iter().map(|s| s.speaker.as_str()).collect(),
        }
    }

    /// Short human-readable description for status lines.
    pub fn describe(&self) -> String {
        match self {
            Self::Single(voice) => voice.clone(),
            Self::MultiSpeaker(speakers) => speakers
                .iter()
                .map(|s| format!("{}={}", s.speaker, s.voice))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn speech_config(&self) -> SpeechConfig {
        match self {
            Self::Single(voice) => SpeechConfig::Prebuilt {
                voice: voice.clone(),
            },
            Self::MultiSpeaker(speakers) => SpeechConfig::MultiSpeaker {
                speakers: speakers.clone(),
            },
        }
    }
}

/// Voice configuration sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechConfig {
    Prebuilt { voice: String },
    MultiSpeaker { speakers: Vec<SpeakerVoice> },
}

/// One request to the external generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub script_text: String,
    pub speech_config: SpeechConfig,
}

impl GenerationRequest {
    /// Voice of a single-speaker request.
    pub fn prebuilt_voice(&self) -> Option<&str> {
        match &self.speech_config {
            SpeechConfig::Prebuilt { voice } => Some(voice),
            SpeechConfig::MultiSpeaker { .. } => None,
        }
    }
}

/// Events surfaced to whatever observes a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    ClipReady(AudioClip),
    StatusUpdate(String),
    /// Clips from the failed primary attempt were discarded.
    FallbackStarted {
        failed_voice: String,
        fallback_voice: String,
    },
    Failed(String),
    Succeeded,
}

impl GenerationEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::StatusUpdate(message.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Succeeded)
    }
}
