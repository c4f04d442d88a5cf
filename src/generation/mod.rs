//! Script-to-audio generation.
//!
//! ```text
//! script ──▶ Orchestrator ──▶ GenerationService ──▶ fragments
//!                │                                     │
//!                │◀──────────── transcode ◀────────────┘
//!                ▼
//!          GenerationSink (events: clips, status, terminal outcome)
//! ```
//!
//! A single-speaker request that fails is retried once with the fallback
//! voice; clips from the failed attempt are discarded.

#[cfg(feature = "remote")]
pub mod gemini;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod sink;
pub mod types;

#[cfg(feature = "remote")]
pub use gemini::GeminiService;
pub use orchestrator::{GenerationHandle, GenerationSettings, Orchestrator};
pub use service::{FragmentStream, GenerationService, MockGenerationService, MockResponse, MockStep};
pub use session::{AttemptStage, GenerationSession, SessionStatus};
pub use sink::{ChannelSink, CollectorSink, GenerationSink};
pub use types::{
    AudioClip, Fragment, GenerationEvent, GenerationRequest, InlineAudio, SpeakerVoice,
    SpeechConfig, VoiceSelection,
};
