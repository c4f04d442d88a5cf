//! Ordered clip playback.
//!
//! [`PlaybackSequencer`] decides which clip plays next; a [`ClipPlayer`]
//! does the actual output.

#[cfg(feature = "cpal-audio")]
pub mod cpal_player;
pub mod pcm;
pub mod player;
pub mod sequencer;

#[cfg(feature = "cpal-audio")]
pub use cpal_player::CpalClipPlayer;
pub use pcm::{DecodedClip, clip_duration, decode_wav, prepare_for_device};
pub use player::{ClipPlayer, MockClipPlayer};
pub use sequencer::{PlaybackSequencer, PlaybackState, PlaybackUpdate};
