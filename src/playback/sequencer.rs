//! Autoplay state machine over the clip list of a generation.
//!
//! The sequencer never owns clips; callers pass the current list on every
//! transition so it always reflects whatever the orchestrator has produced.

use crate::defaults::AUTOPLAY_BLOCKED_MESSAGE;
use crate::generation::AudioClip;
use crate::playback::player::ClipPlayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// Waiting for the first clip.
    Armed,
    Playing(usize),
}

/// What a transition did, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackUpdate {
    Started { index: usize, display_name: String },
    /// The last available clip finished.
    Completed,
    /// Playback could not start; the sequencer is idle again.
    Blocked(String),
}

#[derive(Debug)]
pub struct PlaybackSequencer {
    state: PlaybackState,
}

impl Default for PlaybackSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSequencer {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the playing clip, if any.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Playing(index) => Some(index),
            _ => None,
        }
    }

    /// Mark autoplay pending; called when a generation attempt begins.
    pub fn arm(&mut self) {
        self.state = PlaybackState::Armed;
    }

    /// Notify that `clips` grew. Starts clip 0 if armed.
    pub fn clips_available(
        &mut self,
        clips: &[AudioClip],
        player: &mut dyn ClipPlayer,
    ) -> Option<PlaybackUpdate> {
        if self.state == PlaybackState::Armed && !clips.is_empty() {
            return Some(self.start(0, clips, player));
        }
        None
    }

    /// Natural completion of the clip at `index`.
    ///
    /// Stale notifications for a clip that is no longer current are ignored.
    pub fn clip_finished(
        &mut self,
        index: usize,
        clips: &[AudioClip],
        player: &mut dyn ClipPlayer,
    ) -> Option<PlaybackUpdate> {
        if self.state != PlaybackState::Playing(index) {
            return None;
        }
        let next = index + 1;
        if next < clips.len() {
            Some(self.start(next, clips, player))
        } else {
            tracing::debug!(index, "playback reached end of clip list");
            self.state = PlaybackState::Idle;
            Some(PlaybackUpdate::Completed)
        }
    }

    /// Check the player for completion and advance if the current clip ended.
    pub fn poll(
        &mut self,
        clips: &[AudioClip],
        player: &mut dyn ClipPlayer,
    ) -> Option<PlaybackUpdate> {
        match self.state {
            PlaybackState::Playing(index) if player.is_finished() => {
                self.clip_finished(index, clips, player)
            }
            _ => None,
        }
    }

    /// The clip list was discarded because a new attempt began. Stops any
    /// playing clip and re-arms so the replacement list autoplays from its
    /// first clip.
    pub fn reset(&mut self, player: &mut dyn ClipPlayer) {
        if let PlaybackState::Playing(_) = self.state {
            player.stop();
        }
        self.state = PlaybackState::Armed;
    }

    fn start(
        &mut self,
        index: usize,
        clips: &[AudioClip],
        player: &mut dyn ClipPlayer,
    ) -> PlaybackUpdate {
        let clip = &clips[index];
        match player.play(clip) {
            Ok(()) => {
                tracing::debug!(index, name = %clip.display_name, "playing clip");
                self.state = PlaybackState::Playing(index);
                PlaybackUpdate::Started {
                    index,
                    display_name: clip.display_name.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "playback did not start");
                self.state = PlaybackState::Idle;
                PlaybackUpdate::Blocked(format!("{AUTOPLAY_BLOCKED_MESSAGE} ({e})"))
            }
        }
    }
}
