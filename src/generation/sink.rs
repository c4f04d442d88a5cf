//! Observers that receive generation events as they happen.

use crate::generation::types::{AudioClip, GenerationEvent};
use tokio::sync::mpsc::UnboundedSender;

/// Pluggable event handler for a running generation.
///
/// Called once per event, in order, from the orchestrator's task. Handlers
/// must not block; rendering and playback belong to the receiving side.
pub trait GenerationSink: Send {
    fn handle(&mut self, event: GenerationEvent);

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Collects every event; used by tests and batch callers.
#[derive(Debug, Default)]
pub struct CollectorSink {
    events: Vec<GenerationEvent>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[GenerationEvent] {
        &self.events
    }

    /// Clips as an observer would hold them: dropped on fallback.
    pub fn visible_clips(&self) -> Vec<AudioClip> {
        let mut clips = Vec::new();
        for event in &self.events {
            match event {
                GenerationEvent::ClipReady(clip) => clips.push(clip.clone()),
                GenerationEvent::FallbackStarted { .. } => clips.clear(),
                _ => {}
            }
        }
        clips
    }

    pub fn status_messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GenerationEvent::StatusUpdate(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_event(&self) -> Option<&GenerationEvent> {
        self.events.iter().rev().find(|event| event.is_terminal())
    }
}

impl GenerationSink for CollectorSink {
    fn handle(&mut self, event: GenerationEvent) {
        self.events.push(event);
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Forwards events over an unbounded channel to another task.
pub struct ChannelSink {
    tx: UnboundedSender<GenerationEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<GenerationEvent>) -> Self {
        Self { tx }
    }
}

impl GenerationSink for ChannelSink {
    fn handle(&mut self, event: GenerationEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver dropped; discarding generation event");
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
