//! Turns one streamed fragment into a playable audio blob.

use crate::audio::mime::{is_raw_pcm, parse_mime_type};
use crate::audio::payload::decode_base64;
use crate::audio::wav::wrap_pcm;
use crate::defaults::WAV_MIME_TYPE;
use crate::error::Result;
use std::sync::Arc;

/// Playable bytes plus the MIME tag a player or file needs to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl EncodedAudio {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_wav(&self) -> bool {
        self.mime_type == WAV_MIME_TYPE
    }

    /// File extension matching the tag, `bin` when unknown.
    pub fn file_extension(&self) -> &'static str {
        let essence = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match essence {
            "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/ogg" => "ogg",
            "audio/opus" => "opus",
            "audio/flac" => "flac",
            "audio/aac" => "aac",
            "audio/webm" => "webm",
            _ => "bin",
        }
    }
}

/// Transcode a base64 fragment tagged with `mime_type`.
///
/// Raw PCM (`audio/L...`) is wrapped in a WAV container tagged `audio/wav`.
/// Anything else is assumed to be a complete container and passes through
/// with its original tag.
///
/// # Errors
/// `Decode` for malformed base64, `Format` for an incomplete PCM descriptor.
pub fn transcode_fragment(payload_base64: &str, mime_type: &str) -> Result<EncodedAudio> {
    let bytes = decode_base64(payload_base64)?;

    if is_raw_pcm(mime_type) {
        let format = parse_mime_type(mime_type)?;
        Ok(EncodedAudio::new(wrap_pcm(&bytes, &format), WAV_MIME_TYPE))
    } else {
        Ok(EncodedAudio::new(bytes, mime_type))
    }
}
