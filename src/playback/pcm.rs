//! Decode WAV clips into float frames for an output device.

use crate::audio::EncodedAudio;
use crate::error::{Result, SpeechcastError};
use std::io::Cursor;
use std::time::Duration;

/// Interleaved f32 samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedClip {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Decode a WAV clip. Only integer PCM (8/16/24/32-bit) and 32-bit float are accepted.
///
/// # Errors
/// Returns `Playback` for non-WAV clips and unreadable containers.
pub fn decode_wav(audio: &EncodedAudio) -> Result<DecodedClip> {
    if !audio.is_wav() {
        return Err(SpeechcastError::playback(format!(
            "cannot play '{}' clips on this output",
            audio.mime_type
        )));
    }

    let reader = hound::WavReader::new(Cursor::new(&audio.bytes[..]))
        .map_err(|e| SpeechcastError::playback(format!("invalid WAV clip: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| SpeechcastError::playback(format!("invalid WAV samples: {e}")))?
        }
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| SpeechcastError::playback(format!("invalid WAV samples: {e}")))?,
        (format, bits) => {
            return Err(SpeechcastError::playback(format!(
                "unsupported WAV sample format: {format:?} {bits}-bit"
            )));
        }
    };

    Ok(DecodedClip {
        samples,
        channels: usize::from(spec.channels),
        sample_rate: spec.sample_rate,
    })
}

/// Linear interpolation resampling of interleaved frames.
pub fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || channels == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let frames = samples.len() / channels;
    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let output_frames = (frames as f64 / ratio).ceil() as usize;

    let mut output = Vec::with_capacity(output_frames * channels);
    for i in 0..output_frames {
        let source_pos = i as f64 * ratio;
        let source_idx = (source_pos.floor() as usize).min(frames - 1);
        let fraction = (source_pos - source_idx as f64) as f32;
        for c in 0..channels {
            let left = samples[source_idx * channels + c];
            if source_idx + 1 >= frames {
                output.push(left);
            } else {
                let right = samples[(source_idx + 1) * channels + c];
                output.push(left + (right - left) * fraction);
            }
        }
    }
    output
}

/// Map interleaved frames from `from` channels to `to` channels.
///
/// Mono is duplicated to every output channel; folding to mono averages.
pub fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let mut output = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            output.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            output.extend((0..to).map(|c| frame[c % from]));
        }
    }
    output
}

/// Decode and convert a clip to the device's rate and channel count.
pub fn prepare_for_device(
    audio: &EncodedAudio,
    device_rate: u32,
    device_channels: usize,
) -> Result<Vec<f32>> {
    let clip = decode_wav(audio)?;
    let resampled = resample(&clip.samples, clip.channels, clip.sample_rate, device_rate);
    Ok(remix(&resampled, clip.channels, device_channels))
}

/// Playing time of a WAV clip, read from its header. `None` for other containers.
pub fn clip_duration(audio: &EncodedAudio) -> Option<Duration> {
    if !audio.is_wav() {
        return None;
    }
    let reader = hound::WavReader::new(Cursor::new(&audio.bytes[..])).ok()?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        f64::from(reader.duration()) / f64::from(rate),
    ))
}
