//! Seam to the audio output device.

use crate::error::{Result, SpeechcastError};
use crate::generation::AudioClip;
use std::collections::HashSet;

/// Plays one clip at a time.
///
/// `play` starts playback and returns immediately; completion is observed
/// through `is_finished`. Starting a new clip replaces the current one.
pub trait ClipPlayer: Send {
    /// Start playing `clip`.
    ///
    /// # Errors
    /// Returns `Playback` if the clip cannot be started (no device, an
    /// unsupported container, or output blocked by the environment).
    fn play(&mut self, clip: &AudioClip) -> Result<()>;

    /// Whether the clip last started has played to its end.
    fn is_finished(&self) -> bool;

    /// Stop the current clip, if any.
    fn stop(&mut self);
}

/// Mock player for tests. Completion is driven by the test.
#[derive(Debug, Default)]
pub struct MockClipPlayer {
    played: Vec<usize>,
    failing: HashSet<usize>,
    current: Option<usize>,
    finished: bool,
    auto_finish: bool,
    stops: usize,
}

impl MockClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to start the clip with `sequence_index`.
    pub fn with_failure_at(mut self, sequence_index: usize) -> Self {
        self.failing.insert(sequence_index);
        self
    }

    /// Report every clip as finished as soon as it starts.
    pub fn with_auto_finish(mut self) -> Self {
        self.auto_finish = true;
        self
    }

    /// Mark the current clip as played to its end.
    pub fn finish_current(&mut self) {
        if self.current.is_some() {
            self.finished = true;
        }
    }

    /// Sequence indices of every clip successfully started, in order.
    pub fn played(&self) -> &[usize] {
        &self.played
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn stop_count(&self) -> usize {
        self.stops
    }
}

impl ClipPlayer for MockClipPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        if self.failing.contains(&clip.sequence_index) {
            self.current = None;
            return Err(SpeechcastError::playback(format!(
                "output refused {}",
                clip.display_name
            )));
        }
        self.played.push(clip.sequence_index);
        self.current = Some(clip.sequence_index);
        self.finished = self.auto_finish;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && self.finished
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.current = None;
        self.finished = false;
    }
}
