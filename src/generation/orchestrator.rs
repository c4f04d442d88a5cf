//! Drives one generation: validation, the primary attempt and, for
//! single-speaker requests, one fallback attempt with a known-good voice.

use crate::audio::transcode_fragment;
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, SpeechcastError};
use crate::generation::service::GenerationService;
use crate::generation::session::{AttemptStage, GenerationSession, SessionStatus};
use crate::generation::sink::{ChannelSink, GenerationSink};
use crate::generation::types::{GenerationEvent, GenerationRequest, VoiceSelection};
use crate::voices::validate_speaker_tags;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;

/// Settings the orchestrator needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_script_length: usize,
    pub fallback_voice: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            max_script_length: defaults::MAX_SCRIPT_LENGTH,
            fallback_voice: defaults::FALLBACK_VOICE.to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.generation.model.clone(),
            max_script_length: config.generation.max_script_length,
            fallback_voice: config.generation.fallback_voice.clone(),
        }
    }
}

/// One entry of the attempt plan.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attempt {
    stage: AttemptStage,
    selection: VoiceSelection,
}

/// Generation orchestrator.
pub struct Orchestrator {
    service: Arc<dyn GenerationService>,
    settings: GenerationSettings,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn GenerationService>, settings: GenerationSettings) -> Self {
        Self { service, settings }
    }

    /// Check a script and selection before anything is sent.
    ///
    /// # Errors
    /// `Validation` for a blank or over-length script, an empty speaker
    /// mapping, or a tagged line naming an unrecognized speaker.
    pub fn validate(&self, script: &str, selection: &VoiceSelection) -> Result<()> {
        if script.trim().is_empty() {
            return Err(SpeechcastError::validation(
                "Please enter a script to generate audio.",
            ));
        }

        let max = self.settings.max_script_length;
        if script.chars().count() > max {
            return Err(SpeechcastError::validation(format!(
                "Script exceeds the maximum length of {max} characters."
            )));
        }

        if let VoiceSelection::MultiSpeaker(speakers) = selection {
            if speakers.is_empty() {
                return Err(SpeechcastError::validation(
                    "Multi-speaker mode needs at least one speaker voice.",
                ));
            }
            validate_speaker_tags(script, &selection.recognized_speakers())?;
        }

        Ok(())
    }

    /// Primary attempt, plus a fallback only for a single speaker whose
    /// voice is not already the fallback voice. Never more than two entries.
    fn attempt_plan(&self, selection: &VoiceSelection) -> Vec<Attempt> {
        let mut plan = vec![Attempt {
            stage: AttemptStage::Primary,
            selection: selection.clone(),
        }];
        if let VoiceSelection::Single(voice) = selection
            && *voice != self.settings.fallback_voice
        {
            plan.push(Attempt {
                stage: AttemptStage::Fallback,
                selection: VoiceSelection::single(self.settings.fallback_voice.clone()),
            });
        }
        plan
    }

    /// Run the session to a terminal status, reporting every step to `sink`.
    ///
    /// The caller serializes triggers: a session must not be run twice
    /// concurrently.
    pub async fn run(
        &self,
        session: &mut GenerationSession,
        sink: &mut dyn GenerationSink,
    ) -> SessionStatus {
        if let Err(e) = self.validate(session.script_text(), session.selection()) {
            tracing::info!(error = %e, "generation rejected before request");
            let message = e.to_string();
            session.fail(message.clone());
            sink.handle(GenerationEvent::Failed(message));
            return session.status();
        }

        self.report_status(session, sink, defaults::STATUS_INITIALIZING);

        let mut plan = self.attempt_plan(session.selection()).into_iter().peekable();
        while let Some(attempt) = plan.next() {
            session.begin_stage(attempt.stage);
            let voice = attempt.selection.describe();
            tracing::info!(
                service = self.service.name(),
                stage = ?attempt.stage,
                voice = %voice,
                "starting generation attempt"
            );
            if attempt.stage == AttemptStage::Primary {
                self.report_status(session, sink, format!("Generating with voice: {voice}..."));
            }

            match self.run_attempt(session, &attempt, sink).await {
                Ok(()) => {
                    tracing::info!(
                        clips = session.clips().len(),
                        stage = ?attempt.stage,
                        "generation complete"
                    );
                    let done = match attempt.stage {
                        AttemptStage::Primary => "Audio generation complete!",
                        AttemptStage::Fallback => "Audio generation complete with fallback voice!",
                    };
                    self.report_status(session, sink, done);
                    session.succeed();
                    sink.handle(GenerationEvent::Succeeded);
                    return session.status();
                }
                Err(e) => {
                    tracing::warn!(
                        stage = ?attempt.stage,
                        voice = %voice,
                        error = %e,
                        "generation attempt failed"
                    );
                    if let Some(next) = plan.peek() {
                        let fallback = next.selection.describe();
                        sink.handle(GenerationEvent::FallbackStarted {
                            failed_voice: voice.clone(),
                            fallback_voice: fallback.clone(),
                        });
                        self.report_status(
                            session,
                            sink,
                            format!(
                                "Voice '{voice}' failed. Trying fallback voice '{fallback}'..."
                            ),
                        );
                        continue;
                    }
                    let message = e.to_string();
                    session.fail(message.clone());
                    sink.handle(GenerationEvent::Failed(message));
                    return session.status();
                }
            }
        }

        session.status()
    }

    /// One parameterized attempt: request, then transcode fragments in arrival order.
    async fn run_attempt(
        &self,
        session: &mut GenerationSession,
        attempt: &Attempt,
        sink: &mut dyn GenerationSink,
    ) -> Result<()> {
        let request = GenerationRequest {
            model: self.settings.model.clone(),
            script_text: session.script_text().to_string(),
            speech_config: attempt.selection.speech_config(),
        };

        let mut fragments = self.service.stream(request).await?;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            let Some(inline) = fragment.playable_audio() else {
                continue;
            };

            let audio = transcode_fragment(&inline.data, &inline.mime_type)?;
            let clip = session.push_clip(audio).clone();
            tracing::debug!(
                index = clip.sequence_index,
                bytes = clip.audio.len(),
                mime = %clip.audio.mime_type,
                "clip ready"
            );

            let count = clip.sequence_index + 1;
            sink.handle(GenerationEvent::ClipReady(clip));
            let message = match attempt.stage {
                AttemptStage::Primary => format!("Generated audio chunk {count}."),
                AttemptStage::Fallback => format!("Generated audio chunk {count} with fallback."),
            };
            self.report_status(session, sink, message);
        }

        Ok(())
    }

    fn report_status(
        &self,
        session: &mut GenerationSession,
        sink: &mut dyn GenerationSink,
        message: impl Into<String>,
    ) {
        let message = message.into();
        session.set_status_message(message.clone());
        sink.handle(GenerationEvent::StatusUpdate(message));
    }

    /// Run a generation on a tokio task, streaming its events back.
    pub fn spawn(self: &Arc<Self>, script: String, selection: VoiceSelection) -> GenerationHandle {
        let orchestrator = Arc::clone(self);
        let (tx, events) = unbounded_channel();
        let task = tokio::spawn(async move {
            let mut session = GenerationSession::new(script, selection);
            let mut sink = ChannelSink::new(tx);
            orchestrator.run(&mut session, &mut sink).await;
            session
        });
        GenerationHandle { events, task }
    }
}

/// Handle to a spawned generation.
pub struct GenerationHandle {
    events: UnboundedReceiver<GenerationEvent>,
    task: JoinHandle<GenerationSession>,
}

impl GenerationHandle {
    /// Next event; `None` once the generation has finished and all events were read.
    pub async fn next_event(&mut self) -> Option<GenerationEvent> {
        self.events.recv().await
    }

    /// Wait for the task and return the final session.
    pub async fn finish(self) -> Result<GenerationSession> {
        self.task
            .await
            .map_err(|e| SpeechcastError::Other(format!("generation task failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::service::{MockGenerationService, MockStep};
    use crate::generation::sink::CollectorSink;
    use crate::generation::types::{Fragment, SpeakerVoice, SpeechConfig};

    fn orchestrator(service: &MockGenerationService) -> Orchestrator {
        Orchestrator::new(Arc::new(service.clone()), GenerationSettings::default())
    }

    async fn run(
        service: &MockGenerationService,
        script: &str,
        selection: VoiceSelection,
    ) -> (GenerationSession, CollectorSink) {
        let mut session = GenerationSession::new(script, selection);
        let mut sink = CollectorSink::new();
        orchestrator(service).run(&mut session, &mut sink).await;
        (session, sink)
    }

    fn two_speakers() -> VoiceSelection {
        VoiceSelection::MultiSpeaker(vec![
            SpeakerVoice {
                speaker: "Speaker1".to_string(),
                voice: "Puck".to_string(),
            },
            SpeakerVoice {
                speaker: "Speaker2".to_string(),
                voice: "Kore".to_string(),
            },
        ])
    }

    #[tokio::test]
    async fn successful_primary_collects_clips_in_order() {
        let service = MockGenerationService::new().with_voice(
            "Puck",
            vec![
                MockStep::pcm(&[1, 0, 2, 0]),
                MockStep::empty(),
                MockStep::encoded(&[9, 9, 9], "audio/mpeg"),
            ],
        );

        let (session, sink) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.stage(), AttemptStage::Primary);
        let clips = session.clips();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].sequence_index, 0);
        assert_eq!(clips[0].audio.mime_type, "audio/wav");
        assert_eq!(clips[0].audio.len(), 44 + 4);
        assert_eq!(clips[1].sequence_index, 1);
        assert_eq!(clips[1].audio.mime_type, "audio/mpeg");
        assert_eq!(clips[1].audio.len(), 3);
        assert_eq!(service.request_count(), 1);
        assert_eq!(sink.terminal_event(), Some(&GenerationEvent::Succeeded));
    }

    #[tokio::test]
    async fn status_messages_follow_progress() {
        let service = MockGenerationService::new()
            .with_voice("Puck", vec![MockStep::pcm(&[0, 0]), MockStep::pcm(&[0, 0])]);

        let (session, sink) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(
            sink.status_messages(),
            vec![
                "Initializing audio generation...",
                "Generating with voice: Puck...",
                "Generated audio chunk 1.",
                "Generated audio chunk 2.",
                "Audio generation complete!",
            ]
        );
        assert_eq!(session.status_message(), Some("Audio generation complete!"));
    }

    #[tokio::test]
    async fn clip_events_arrive_before_completion() {
        let service = MockGenerationService::new().with_voice("Puck", vec![MockStep::pcm(&[0, 0])]);
        let (_, sink) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        let clip_pos = sink
            .events()
            .iter()
            .position(|e| matches!(e, GenerationEvent::ClipReady(_)))
            .unwrap();
        let done_pos = sink
            .events()
            .iter()
            .position(|e| *e == GenerationEvent::Succeeded)
            .unwrap();
        assert!(clip_pos < done_pos);
    }

    #[tokio::test]
    async fn mid_stream_failure_falls_back_and_discards_primary_clips() {
        let service = MockGenerationService::new()
            .with_voice(
                "Puck",
                vec![
                    MockStep::pcm(&[1, 1]),
                    MockStep::pcm(&[2, 2]),
                    MockStep::fail("stream reset"),
                ],
            )
            .with_voice("Zephyr", vec![MockStep::pcm(&[3, 3, 3, 3])]);

        let (session, sink) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.stage(), AttemptStage::Fallback);
        let clips = session.clips();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].sequence_index, 0);
        assert_eq!(&clips[0].audio.bytes[44..], &[3, 3, 3, 3]);

        let requests = service.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].prebuilt_voice(), Some("Puck"));
        assert_eq!(requests[1].prebuilt_voice(), Some("Zephyr"));
        assert_eq!(requests[0].script_text, requests[1].script_text);

        assert!(sink.events().contains(&GenerationEvent::FallbackStarted {
            failed_voice: "Puck".to_string(),
            fallback_voice: "Zephyr".to_string(),
        }));
        assert_eq!(sink.visible_clips(), clips.to_vec());
        let statuses = sink.status_messages();
        assert!(statuses.contains(&"Voice 'Puck' failed. Trying fallback voice 'Zephyr'..."));
        assert!(statuses.contains(&"Generated audio chunk 1 with fallback."));
        assert_eq!(
            statuses.last(),
            Some(&"Audio generation complete with fallback voice!")
        );
    }

    #[tokio::test]
    async fn rejected_request_also_triggers_fallback() {
        let service = MockGenerationService::new()
            .with_rejected_voice("Charon", "voice unavailable")
            .with_voice("Zephyr", vec![MockStep::pcm(&[0, 0])]);

        let (session, _) = run(&service, "Hello", VoiceSelection::single("Charon")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.clips().len(), 1);
        assert_eq!(service.request_count(), 2);
    }

    #[tokio::test]
    async fn fallback_voice_failure_is_terminal_without_retry() {
        let service = MockGenerationService::new()
            .with_voice("Zephyr", vec![MockStep::pcm(&[0, 0]), MockStep::fail("quota exceeded")]);

        let (session, sink) = run(&service, "Hello", VoiceSelection::single("Zephyr")).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(service.request_count(), 1);
        assert_eq!(
            session.error_message(),
            Some("Generation request failed: quota exceeded")
        );
        assert!(session.status_message().is_none());
        assert_eq!(
            sink.terminal_event(),
            Some(&GenerationEvent::Failed(
                "Generation request failed: quota exceeded".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn both_attempts_failing_surfaces_fallback_error() {
        let service = MockGenerationService::new()
            .with_voice("Puck", vec![MockStep::fail("primary broke")])
            .with_voice("Zephyr", vec![MockStep::fail("fallback broke")]);

        let (session, _) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(service.request_count(), 2);
        assert_eq!(
            session.error_message(),
            Some("Generation request failed: fallback broke")
        );
    }

    #[tokio::test]
    async fn malformed_mime_type_triggers_fallback() {
        let service = MockGenerationService::new()
            .with_voice(
                "Puck",
                vec![MockStep::Fragment(Fragment::audio("AAAA", "audio/L16"))],
            )
            .with_voice("Zephyr", vec![MockStep::pcm(&[0, 0])]);

        let (session, _) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.stage(), AttemptStage::Fallback);
        assert_eq!(service.request_count(), 2);
    }

    #[tokio::test]
    async fn undecodable_payload_triggers_fallback() {
        let service = MockGenerationService::new()
            .with_voice(
                "Puck",
                vec![MockStep::Fragment(Fragment::audio(
                    "not base64!",
                    "audio/L16;rate=24000",
                ))],
            )
            .with_voice("Zephyr", vec![MockStep::pcm(&[5, 5])]);

        let (session, sink) = run(&service, "Hello", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.stage(), AttemptStage::Fallback);
        assert_eq!(&session.clips()[0].audio.bytes[44..], &[5, 5]);
        assert!(sink.events().contains(&GenerationEvent::FallbackStarted {
            failed_voice: "Puck".to_string(),
            fallback_voice: "Zephyr".to_string(),
        }));
    }

    #[tokio::test]
    async fn blank_script_fails_validation_without_request() {
        let service = MockGenerationService::new();
        let (session, sink) = run(&service, "   \n\t", VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(
            session.error_message(),
            Some("Please enter a script to generate audio.")
        );
        assert_eq!(service.request_count(), 0);
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn over_length_script_fails_validation_without_request() {
        let service = MockGenerationService::new();
        let script = "a".repeat(defaults::MAX_SCRIPT_LENGTH + 1);
        let (session, _) = run(&service, &script, VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(
            session.error_message(),
            Some("Script exceeds the maximum length of 5000 characters.")
        );
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn script_at_max_length_is_accepted() {
        let service = MockGenerationService::new();
        let script = "é".repeat(defaults::MAX_SCRIPT_LENGTH);
        let (session, _) = run(&service, &script, VoiceSelection::single("Puck")).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn unrecognized_speaker_fails_before_request() {
        let service = MockGenerationService::new();
        let (session, _) = run(&service, "Speaker1: hello\nBob: \"hi\"", two_speakers()).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert!(session.error_message().unwrap_or_default().contains("'Bob'"));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn multi_speaker_request_carries_mapping() {
        let service = MockGenerationService::new().with_default(vec![MockStep::pcm(&[0, 0])]);
        let (session, _) = run(&service, "Speaker1: hi\nSpeaker2: hello", two_speakers()).await;

        assert_eq!(session.status(), SessionStatus::Succeeded);
        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        match &requests[0].speech_config {
            SpeechConfig::MultiSpeaker { speakers } => assert_eq!(speakers.len(), 2),
            other => panic!("Expected multi-speaker config, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn multi_speaker_stream_error_is_terminal() {
        let service = MockGenerationService::new()
            .with_default(vec![MockStep::pcm(&[0, 0]), MockStep::fail("broken")]);
        let (session, sink) = run(&service, "Speaker1: hi", two_speakers()).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(service.request_count(), 1);
        assert!(
            !sink
                .events()
                .iter()
                .any(|e| matches!(e, GenerationEvent::FallbackStarted { .. }))
        );
    }

    #[tokio::test]
    async fn multi_speaker_rejection_fails_with_service_message() {
        let service = MockGenerationService::new().with_default_rejection("quota exceeded");
        let (session, sink) = run(&service, "Speaker1: hi", two_speakers()).await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(service.request_count(), 1);
        assert_eq!(
            sink.terminal_event(),
            Some(&GenerationEvent::Failed(
                "Generation request failed: quota exceeded".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn empty_speaker_mapping_is_rejected() {
        let service = MockGenerationService::new();
        let (session, _) = run(&service, "hello", VoiceSelection::MultiSpeaker(Vec::new())).await;
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(service.request_count(), 0);
    }

    #[test]
    fn attempt_plan_is_bounded_at_two() {
        let service = MockGenerationService::new();
        let orchestrator = orchestrator(&service);

        assert_eq!(orchestrator.attempt_plan(&VoiceSelection::single("Puck")).len(), 2);
        assert_eq!(orchestrator.attempt_plan(&VoiceSelection::single("Zephyr")).len(), 1);
        assert_eq!(orchestrator.attempt_plan(&two_speakers()).len(), 1);
    }

    #[tokio::test]
    async fn spawned_generation_streams_events_and_returns_session() {
        let service = MockGenerationService::new()
            .with_voice("Puck", vec![MockStep::pcm(&[0, 0]), MockStep::pcm(&[1, 1])]);
        let orchestrator = Arc::new(orchestrator(&service));

        let mut handle = orchestrator.spawn("Hello".to_string(), VoiceSelection::single("Puck"));
        let mut clip_indices = Vec::new();
        let mut last = None;
        while let Some(event) = handle.next_event().await {
            if let GenerationEvent::ClipReady(clip) = &event {
                clip_indices.push(clip.sequence_index);
            }
            last = Some(event);
        }

        assert_eq!(clip_indices, vec![0, 1]);
        assert_eq!(last, Some(GenerationEvent::Succeeded));
        let session = handle.finish().await.unwrap();
        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.clips().len(), 2);
    }
}
