//! State of one user-triggered generation.

use crate::audio::EncodedAudio;
use crate::generation::types::{AudioClip, VoiceSelection};

/// Which attempt of the primary/fallback protocol is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Ephemeral session state, mutated only by the orchestrator while running.
///
/// `clips` grows monotonically during a stage and is cleared exactly once,
/// when the primary stage hands over to the fallback stage.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    script_text: String,
    selection: VoiceSelection,
    stage: AttemptStage,
    clips: Vec<AudioClip>,
    status: SessionStatus,
    error_message: Option<String>,
    status_message: Option<String>,
}

impl GenerationSession {
    pub fn new(script_text: impl Into<String>, selection: VoiceSelection) -> Self {
        Self {
            script_text: script_text.into(),
            selection,
            stage: AttemptStage::Primary,
            clips: Vec::new(),
            status: SessionStatus::Idle,
            error_message: None,
            status_message: None,
        }
    }

    pub fn script_text(&self) -> &str {
        &self.script_text
    }

    pub fn selection(&self) -> &VoiceSelection {
        &self.selection
    }

    pub fn stage(&self) -> AttemptStage {
        self.stage
    }

    pub fn clips(&self) -> &[AudioClip] {
        &self.clips
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Latest in-progress status line; cleared on terminal failure.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Enter `stage`. Moving into the fallback stage discards every clip of
    /// the primary attempt so indices restart at 0.
    pub(crate) fn begin_stage(&mut self, stage: AttemptStage) {
        if stage == AttemptStage::Fallback && self.stage == AttemptStage::Primary {
            self.clips.clear();
        }
        self.stage = stage;
        self.status = SessionStatus::Running;
        self.error_message = None;
    }

    /// Append a clip with the next sequence index.
    pub(crate) fn push_clip(&mut self, audio: EncodedAudio) -> &AudioClip {
        let clip = AudioClip::new(self.clips.len(), audio);
        self.clips.push(clip);
        &self.clips[self.clips.len() - 1]
    }

    pub(crate) fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub(crate) fn succeed(&mut self) {
        self.status = SessionStatus::Succeeded;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error_message = Some(message.into());
        self.status_message = None;
    }
}
