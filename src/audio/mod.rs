//! Audio fragment transcoding.
//!
//! Streamed fragments arrive as base64 text tagged with a MIME descriptor.
//! Raw PCM is wrapped in a canonical WAV container; encoded formats pass through.

pub mod mime;
pub mod payload;
pub mod transcode;
pub mod wav;

pub use mime::{PcmFormat, is_raw_pcm, parse_mime_type};
pub use payload::decode_base64;
pub use transcode::{EncodedAudio, transcode_fragment};
pub use wav::{WAV_HEADER_LEN, build_wav_header, wrap_pcm};
