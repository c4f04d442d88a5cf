//! Speech generation application entry point.
//!
//! Orchestrates the complete script-to-speech flow:
//! read script → generate → play → export

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::export::export_clips;
use crate::generation::{
    AudioClip, GeminiService, GenerationEvent, GenerationService, GenerationSession,
    GenerationSettings, Orchestrator, SessionStatus, VoiceSelection,
};
use crate::output::{render_event, render_playback};
use crate::playback::{ClipPlayer, PlaybackSequencer, PlaybackUpdate, clip_duration};
use crate::voices::uses_speaker_tags;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

/// How often the sequencer checks the player for a finished clip.
const PLAYBACK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Allowance per clip, beyond its length, when waiting for playback to drain.
const PLAYBACK_DRAIN_SLACK: Duration = Duration::from_secs(1);

/// Run the generate command: read script → generate → play → export.
///
/// Returns the terminal status; the caller decides the exit code.
pub async fn run_generate_command(
    config: Config,
    args: GenerateArgs,
    quiet: bool,
) -> Result<SessionStatus> {
    let script = read_script(&args, std::io::stdin().lock())?;
    let config = apply_overrides(config, &args);
    config.validate()?;

    let selection = resolve_selection(&config, &args, &script);
    tracing::info!(
        voice = %selection.describe(),
        model = %config.generation.model,
        "starting generation"
    );

    let service: Arc<dyn GenerationService> = Arc::new(GeminiService::from_config(&config)?);
    let orchestrator = Arc::new(Orchestrator::new(
        service,
        GenerationSettings::from_config(&config),
    ));

    let mut player = if args.no_play || !config.playback.autoplay {
        None
    } else {
        open_player(quiet)
    };

    let session = drive_generation(
        &orchestrator,
        script,
        selection,
        player.as_deref_mut().map(|p| p as &mut dyn ClipPlayer),
        quiet,
    )
    .await?;

    let out_dir = args.out_dir.clone().or(config.playback.output_dir.clone());
    if session.status() == SessionStatus::Succeeded
        && let Some(dir) = out_dir
    {
        let paths = export_clips(session.clips(), &dir)?;
        if !quiet {
            for path in &paths {
                eprintln!("Saved {}", path.display());
            }
        }
    }

    Ok(session.status())
}

/// Script from `--text`, a file, or stdin (`-` or no argument).
pub fn read_script(args: &GenerateArgs, mut stdin: impl Read) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    match &args.script_file {
        Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut script = String::new();
            stdin.read_to_string(&mut script)?;
            Ok(script)
        }
    }
}

/// Apply CLI overrides on top of the loaded configuration.
pub fn apply_overrides(mut config: Config, args: &GenerateArgs) -> Config {
    if let Some(model) = &args.model {
        config.generation.model = model.clone();
    }
    if let Some(voice) = &args.voice {
        config.generation.voice = voice.clone();
    }
    if let Some(timeout) = args.timeout {
        config.service.request_timeout_secs = timeout.as_secs().max(1);
    }
    if !args.speakers.is_empty() {
        config.speakers.0 = args.speakers.iter().cloned().collect::<BTreeMap<_, _>>();
    }
    config
}

/// Pick single- or multi-speaker mode.
///
/// Multi-speaker when speakers were given explicitly, when forced, or when the
/// script tags lines with a recognized speaker.
pub fn resolve_selection(config: &Config, args: &GenerateArgs, script: &str) -> VoiceSelection {
    let tags = config.speakers.tags();
    if !args.speakers.is_empty() || args.multi_speaker || uses_speaker_tags(script, &tags) {
        VoiceSelection::multi_speaker_from(config.speakers.map())
    } else {
        VoiceSelection::single(config.generation.voice.clone())
    }
}

#[cfg(feature = "cpal-audio")]
fn open_player(quiet: bool) -> Option<Box<dyn ClipPlayer>> {
    match crate::playback::CpalClipPlayer::new() {
        Ok(player) => Some(Box::new(player)),
        Err(e) => {
            tracing::warn!(error = %e, "no audio output, playback disabled");
            if !quiet {
                render_playback(&PlaybackUpdate::Blocked(format!(
                    "{} ({e})",
                    crate::defaults::AUTOPLAY_BLOCKED_MESSAGE
                )));
            }
            None
        }
    }
}

#[cfg(not(feature = "cpal-audio"))]
fn open_player(_quiet: bool) -> Option<Box<dyn ClipPlayer>> {
    tracing::info!("built without audio output, playback disabled");
    None
}

/// Print above the spinner; nothing is shown in quiet mode.
fn show(progress: &Option<ProgressBar>, f: impl FnOnce()) {
    if let Some(pb) = progress {
        pb.suspend(f);
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        // SAFETY: hardcoded template string, always valid
        #[allow(clippy::expect_used)]
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("hardcoded spinner template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run a generation to completion while rendering events and sequencing playback.
///
/// Playback keeps going after generation ends until the last started clip finishes.
pub async fn drive_generation(
    orchestrator: &Arc<Orchestrator>,
    script: String,
    selection: VoiceSelection,
    mut player: Option<&mut dyn ClipPlayer>,
    quiet: bool,
) -> Result<GenerationSession> {
    let mut handle = orchestrator.spawn(script, selection);
    let mut sequencer = PlaybackSequencer::new();
    let mut clips: Vec<AudioClip> = Vec::new();
    if player.is_some() {
        sequencer.arm();
    }

    let progress = (!quiet).then(spinner);

    let mut tick = tokio::time::interval(PLAYBACK_POLL_INTERVAL);
    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };

                match &event {
                    GenerationEvent::StatusUpdate(message) => {
                        if let Some(pb) = &progress {
                            pb.set_message(message.clone());
                        }
                    }
                    _ => show(&progress, || render_event(&event)),
                }

                let update = match &event {
                    GenerationEvent::ClipReady(clip) => {
                        clips.push(clip.clone());
                        player
                            .as_deref_mut()
                            .and_then(|p| sequencer.clips_available(&clips, p))
                    }
                    GenerationEvent::FallbackStarted { .. } => {
                        clips.clear();
                        if let Some(p) = player.as_deref_mut() {
                            sequencer.reset(p);
                        }
                        None
                    }
                    _ => None,
                };
                if let Some(update) = update {
                    show(&progress, || render_playback(&update));
                }
            }
            _ = tick.tick() => {
                if let Some(update) = player
                    .as_deref_mut()
                    .and_then(|p| sequencer.poll(&clips, p))
                {
                    show(&progress, || render_playback(&update));
                }
            }
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let session = handle.finish().await?;
    if !quiet && let Some(message) = session.status_message() {
        eprintln!("{message}");
    }

    if let Some(p) = player
        && let Some(current) = sequencer.current_index()
    {
        let deadline =
            tokio::time::Instant::now() + drain_budget(clips.get(current..).unwrap_or(&[]));
        while sequencer.current_index().is_some() {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!("playback did not finish in time, stopping");
                p.stop();
                break;
            }
            tick.tick().await;
            if let Some(update) = sequencer.poll(&clips, p)
                && !quiet
            {
                render_playback(&update);
            }
        }
    }

    Ok(session)
}

/// Longest wait for `remaining` clips to play out.
fn drain_budget(remaining: &[AudioClip]) -> Duration {
    remaining
        .iter()
        .map(|clip| clip_duration(&clip.audio).unwrap_or_default() + PLAYBACK_DRAIN_SLACK)
        .sum()
}
