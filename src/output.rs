//! Terminal rendering of generation and playback events.

use crate::generation::GenerationEvent;
use crate::playback::PlaybackUpdate;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Clear the current terminal line (replaces a spinner etc.)
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// Line for a generation event, or `None` for events with nothing to show.
pub fn format_event(event: &GenerationEvent) -> Option<String> {
    match event {
        GenerationEvent::ClipReady(clip) => Some(format!(
            "{GREEN}+ {}{RESET} {DIM}({}, {}){RESET}",
            clip.display_name,
            clip.audio.mime_type,
            format_size(clip.audio.len())
        )),
        GenerationEvent::StatusUpdate(message) => Some(format!("{DIM}{message}{RESET}")),
        GenerationEvent::FallbackStarted { failed_voice, .. } => Some(format!(
            "{YELLOW}Discarded clips from voice '{failed_voice}'{RESET}"
        )),
        GenerationEvent::Failed(message) => Some(format!("{RED}Error: {message}{RESET}")),
        // The completion status line already says it.
        GenerationEvent::Succeeded => None,
    }
}

/// Line for a playback transition.
pub fn format_playback(update: &PlaybackUpdate) -> String {
    match update {
        PlaybackUpdate::Started { display_name, .. } => {
            format!("{DIM}Playing {display_name}{RESET}")
        }
        PlaybackUpdate::Completed => format!("{DIM}Playback finished{RESET}"),
        PlaybackUpdate::Blocked(message) => format!("{YELLOW}{message}{RESET}"),
    }
}

/// Render a generation event to stderr.
pub fn render_event(event: &GenerationEvent) {
    if let Some(line) = format_event(event) {
        clear_line();
        eprintln!("{line}");
    }
}

/// Render a playback transition to stderr.
pub fn render_playback(update: &PlaybackUpdate) {
    clear_line();
    eprintln!("{}", format_playback(update));
}
