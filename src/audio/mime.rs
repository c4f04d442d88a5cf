//! Audio MIME descriptor parsing.
//!
//! Raw PCM fragments arrive tagged `audio/L<bits>;rate=<hz>`. Parameters are
//! semicolon separated and may appear in any order.

use crate::defaults::RAW_PCM_MIME_PREFIX;
use crate::error::{Result, SpeechcastError};

const RATE_PARAM: &str = "rate=";

/// PCM layout parameters carried by a raw audio descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channel_count: u32,
    pub sample_rate_hz: u32,
    pub bits_per_sample: u32,
}

impl PcmFormat {
    /// Mono format with the given rate and depth.
    pub fn mono(sample_rate_hz: u32, bits_per_sample: u32) -> Self {
        Self {
            channel_count: 1,
            sample_rate_hz,
            bits_per_sample,
        }
    }
}

/// Whether a MIME type denotes raw linear PCM that needs a container.
pub fn is_raw_pcm(mime_type: &str) -> bool {
    mime_type.starts_with(RAW_PCM_MIME_PREFIX)
}

/// Parse an `audio/L<bits>;rate=<hz>` descriptor into a [`PcmFormat`].
///
/// The channel count is always 1; the wire format has no channel parameter.
/// A repeated `rate=` overrides the previous one, and a bit-depth token is
/// only taken when its digits parse.
///
/// # Errors
/// `Format` when no usable sample rate or bit depth is present.
pub fn parse_mime_type(mime_type: &str) -> Result<PcmFormat> {
    let mut sample_rate = None;
    let mut bits_per_sample = None;

    for param in mime_type.split(';').map(str::trim) {
        if let Some(rate) = param.strip_prefix(RATE_PARAM) {
            sample_rate = parse_leading_uint(rate);
        } else if let Some(bits) = param.strip_prefix(RAW_PCM_MIME_PREFIX)
            && let Some(bits) = parse_leading_uint(bits)
        {
            bits_per_sample = Some(bits);
        }
    }

    let sample_rate_hz = sample_rate
        .filter(|&rate| rate > 0)
        .ok_or_else(|| format_error(mime_type, "Sample rate not found in mime type"))?;
    let bits_per_sample = bits_per_sample
        .filter(|&bits| bits > 0)
        .ok_or_else(|| format_error(mime_type, "Bit depth not found in mime type"))?;

    Ok(PcmFormat::mono(sample_rate_hz, bits_per_sample))
}

/// Lenient integer parse: leading whitespace skipped, trailing garbage ignored.
fn parse_leading_uint(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

fn format_error(mime_type: &str, message: &str) -> SpeechcastError {
    SpeechcastError::Format {
        mime_type: mime_type.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_descriptor() {
        let format = parse_mime_type("audio/L16;rate=24000").unwrap();
        assert_eq!(format, PcmFormat::mono(24000, 16));
        assert_eq!(format.channel_count, 1);
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let forward = parse_mime_type("audio/L16;rate=24000").unwrap();
        let reversed = parse_mime_type("rate=24000;audio/L16").unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn parsing_is_idempotent() {
        let descriptor = "audio/L24; rate=48000";
        assert_eq!(
            parse_mime_type(descriptor).unwrap(),
            parse_mime_type(descriptor).unwrap()
        );
    }

    #[test]
    fn whitespace_around_params_is_trimmed() {
        let format = parse_mime_type("  audio/L8 ;   rate=8000  ").unwrap();
        assert_eq!(format, PcmFormat::mono(8000, 8));
    }

    #[test]
    fn unknown_params_are_ignored() {
        let format = parse_mime_type("audio/L16;codec=pcm;rate=16000;endian=little").unwrap();
        assert_eq!(format, PcmFormat::mono(16000, 16));
    }

    #[test]
    fn trailing_garbage_after_digits_is_ignored() {
        let format = parse_mime_type("audio/L16bit;rate=24000hz").unwrap();
        assert_eq!(format, PcmFormat::mono(24000, 16));
    }

    #[test]
    fn missing_rate_is_format_error() {
        match parse_mime_type("audio/L16") {
            Err(SpeechcastError::Format { mime_type, message }) => {
                assert_eq!(mime_type, "audio/L16");
                assert_eq!(message, "Sample rate not found in mime type");
            }
            other => panic!("Expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn missing_bit_depth_is_format_error() {
        match parse_mime_type("audio/pcm;rate=24000") {
            Err(SpeechcastError::Format { message, .. }) => {
                assert_eq!(message, "Bit depth not found in mime type");
            }
            other => panic!("Expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_bit_depth_is_not_taken() {
        assert!(matches!(
            parse_mime_type("audio/Lxx;rate=24000"),
            Err(SpeechcastError::Format { .. })
        ));
    }

    #[test]
    fn invalid_bit_depth_does_not_clobber_valid_one() {
        let format = parse_mime_type("audio/L16;rate=24000;audio/Lxx").unwrap();
        assert_eq!(format.bits_per_sample, 16);
    }

    #[test]
    fn last_rate_wins() {
        let format = parse_mime_type("audio/L16;rate=16000;rate=44100").unwrap();
        assert_eq!(format.sample_rate_hz, 44100);
    }

    #[test]
    fn unparseable_trailing_rate_clears_earlier_rate() {
        assert!(parse_mime_type("audio/L16;rate=16000;rate=fast").is_err());
    }

    #[test]
    fn zero_rate_counts_as_missing() {
        assert!(parse_mime_type("audio/L16;rate=0").is_err());
    }

    #[test]
    fn non_standard_bit_depth_is_accepted() {
        let format = parse_mime_type("audio/L12;rate=22050").unwrap();
        assert_eq!(format.bits_per_sample, 12);
    }

    #[test]
    fn raw_pcm_detection_uses_prefix() {
        assert!(is_raw_pcm("audio/L16;rate=24000"));
        assert!(is_raw_pcm("audio/L"));
        assert!(!is_raw_pcm("audio/mpeg"));
        assert!(!is_raw_pcm("audio/l16;rate=24000"));
        assert!(!is_raw_pcm(" audio/L16"));
    }

    #[test]
    fn parse_leading_uint_cases() {
        assert_eq!(parse_leading_uint("24000"), Some(24000));
        assert_eq!(parse_leading_uint("  42abc"), Some(42));
        assert_eq!(parse_leading_uint("+7"), Some(7));
        assert_eq!(parse_leading_uint("-7"), None);
        assert_eq!(parse_leading_uint(""), None);
        assert_eq!(parse_leading_uint("abc"), None);
        assert_eq!(parse_leading_uint("99999999999"), None);
    }
}
