//! Prebuilt voice catalog and speaker-tag handling for multi-speaker scripts.
//!
//! A speaker tag is a line prefix `<token>:` where the token is a run of
//! ASCII letters, digits or underscores. Tags are matched case-sensitively.

use crate::error::{Result, SpeechcastError};

/// A prebuilt voice offered by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
}

/// A labelled group of voices for display.
#[derive(Debug, Clone, Copy)]
pub struct VoiceGroup {
    pub label: &'static str,
    pub voices: &'static [Voice],
}

const fn voice(id: &'static str) -> Voice {
    Voice { id, name: id }
}

pub static VOICE_GROUPS: &[VoiceGroup] = &[
    VoiceGroup {
        label: "Male Voices",
        voices: &[
            voice("Puck"),
            voice("Charon"),
            voice("Fenrir"),
            voice("Orus"),
            voice("Enceladus"),
            voice("Iapetus"),
            voice("Umbriel"),
            voice("Algieba"),
            voice("Algenib"),
            voice("Rasalgethi"),
            voice("Achernar"),
            voice("Alnilam"),
            voice("Schedar"),
            voice("Gacrux"),
            voice("Achird"),
            voice("Zubenelgenubi"),
            voice("Sadachbia"),
            voice("Sadaltager"),
            voice("Sulafar"),
        ],
    },
    VoiceGroup {
        label: "Female Voices",
        voices: &[
            voice("Zephyr"),
            voice("Kore"),
            voice("Leda"),
            voice("Aoede"),
            voice("Callirhoe"),
            voice("Autonoe"),
            voice("Despina"),
            voice("Erinome"),
            voice("Laomedeia"),
            voice("Pulcherrima"),
            voice("Vindemiatrix"),
        ],
    },
];

/// Iterate every catalog voice in display order.
pub fn all_voices() -> impl Iterator<Item = &'static Voice> {
    VOICE_GROUPS.iter().flat_map(|group| group.voices.iter())
}

pub fn is_known_voice(id: &str) -> bool {
    all_voices().any(|v| v.id == id)
}

/// Whether `token` is well-formed as a speaker tag.
pub fn is_valid_tag_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract the speaker tag of a line, if it has the `<token>:` form.
pub fn speaker_tag(line: &str) -> Option<&str> {
    let (token, _) = line.trim_start().split_once(':')?;
    let token = token.trim_end();
    is_valid_tag_token(token).then_some(token)
}

/// Whether any line of the script is tagged with a recognized speaker.
pub fn uses_speaker_tags<S: AsRef<str>>(script: &str, recognized: &[S]) -> bool {
    script
        .lines()
        .filter_map(speaker_tag)
        .any(|tag| recognized.iter().any(|r| r.as_ref() == tag))
}

/// Reject the first tagged line whose speaker is not recognized.
///
/// # Errors
/// `Validation` naming the tag and its 1-based line number.
pub fn validate_speaker_tags<S: AsRef<str>>(script: &str, recognized: &[S]) -> Result<()> {
    for (number, line) in script.lines().enumerate() {
        let Some(tag) = speaker_tag(line) else {
            continue;
        };
        if !recognized.iter().any(|r| r.as_ref() == tag) {
            let list: Vec<&str> = recognized.iter().map(AsRef::as_ref).collect();
            return Err(SpeechcastError::validation(format!(
                "Unrecognized speaker '{}' on line {}. Recognized speakers: {}",
                tag,
                number + 1,
                list.join(", ")
            )));
        }
    }
    Ok(())
}
