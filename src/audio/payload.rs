//! Base64 payload decoding for inline audio data.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Decode a standard-alphabet, padded base64 string into raw bytes.
///
/// # Errors
/// `Decode` on characters outside the alphabet or incorrect padding.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpeechcastError;

    #[test]
    fn decodes_known_vector() {
        assert_eq!(decode_base64("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decodes_binary_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = BASE64.encode(&bytes);
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn empty_input_decodes_to_empty() {
        assert!(decode_base64("").unwrap().is_empty());
    }

    #[test]
    fn non_alphabet_character_is_decode_error() {
        assert!(matches!(
            decode_base64("aGVs*G8="),
            Err(SpeechcastError::Decode(_))
        ));
    }

    #[test]
    fn bad_padding_is_decode_error() {
        assert!(matches!(
            decode_base64("aGVsbG8"),
            Err(SpeechcastError::Decode(_))
        ));
        assert!(matches!(
            decode_base64("aGVsbG8=="),
            Err(SpeechcastError::Decode(_))
        ));
    }
}
