//! Clip playback through the default output device using CPAL.

use crate::error::{Result, SpeechcastError};
use crate::generation::AudioClip;
use crate::playback::pcm::prepare_for_device;
use crate::playback::player::ClipPlayer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig, SupportedStreamConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Extra time a clip may take past its length before it counts as finished.
const PLAYBACK_SLACK: Duration = Duration::from_secs(2);

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// CPAL probing makes ALSA/JACK print diagnostics that mean nothing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` on fd 2. Safe as long as no other thread is
/// concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched through `&mut CpalClipPlayer`, so it is
/// never accessed from two threads at once.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

struct ActivePlayback {
    _stream: SendableStream,
    /// Set when the buffer drains or the stream reports an error.
    finished: Arc<AtomicBool>,
    /// A device that stops calling back still ends the clip here.
    deadline: Instant,
}

/// Latest time `samples` interleaved values can take to play at `rate`.
fn playback_deadline(samples: usize, channels: usize, rate: u32) -> Duration {
    if channels == 0 || rate == 0 {
        return PLAYBACK_SLACK;
    }
    let frames = samples / channels;
    Duration::from_secs_f64(frames as f64 / f64::from(rate)) + PLAYBACK_SLACK
}

/// Plays WAV clips on the default output device.
pub struct CpalClipPlayer {
    device: cpal::Device,
    supported_config: SupportedStreamConfig,
    active: Option<ActivePlayback>,
}

impl CpalClipPlayer {
    /// Open the default output device.
    ///
    /// # Errors
    /// Returns `Playback` if no output device is available.
    pub fn new() -> Result<Self> {
        let (device, supported_config) = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SpeechcastError::playback("no output device available"))?;
            let config = device.default_output_config().map_err(|e| {
                SpeechcastError::playback(format!("failed to query output config: {e}"))
            })?;
            Ok::<_, SpeechcastError>((device, config))
        })?;

        tracing::debug!(
            rate = supported_config.sample_rate().0,
            channels = supported_config.channels(),
            format = ?supported_config.sample_format(),
            "opened output device"
        );

        Ok(Self {
            device,
            supported_config,
            active: None,
        })
    }

    fn build_stream<T>(
        &self,
        config: &StreamConfig,
        samples: Arc<Vec<f32>>,
        finished: Arc<AtomicBool>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32> + Default + Send + 'static,
    {
        let position = AtomicUsize::new(0);
        let errored = Arc::clone(&finished);
        self.device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let pos = position.load(Ordering::Relaxed);
                    let remaining = samples.len().saturating_sub(pos);
                    if remaining == 0 {
                        data.fill(T::default());
                        finished.store(true, Ordering::SeqCst);
                        return;
                    }

                    let to_copy = remaining.min(data.len());
                    for (out, &sample) in data.iter_mut().zip(&samples[pos..pos + to_copy]) {
                        *out = T::from_sample(sample);
                    }
                    data[to_copy..].fill(T::default());
                    position.store(pos + to_copy, Ordering::Relaxed);
                },
                move |err| {
                    tracing::error!(error = %err, "playback stream error, ending clip");
                    errored.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| {
                SpeechcastError::playback(format!("failed to build output stream: {e}"))
            })
    }
}

impl ClipPlayer for CpalClipPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        self.stop();

        let rate = self.supported_config.sample_rate().0;
        let channels = usize::from(self.supported_config.channels());
        let samples = Arc::new(prepare_for_device(&clip.audio, rate, channels)?);
        let deadline = Instant::now() + playback_deadline(samples.len(), channels, rate);
        let finished = Arc::new(AtomicBool::new(false));
        let config: StreamConfig = self.supported_config.clone().into();

        let stream = match self.supported_config.sample_format() {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&config, samples, Arc::clone(&finished))?
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&config, samples, Arc::clone(&finished))?
            }
            SampleFormat::U16 => {
                self.build_stream::<u16>(&config, samples, Arc::clone(&finished))?
            }
            format => {
                return Err(SpeechcastError::playback(format!(
                    "unsupported output sample format: {format:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| {
                SpeechcastError::playback(format!("failed to start output stream: {e}"))
            })?;

        self.active = Some(ActivePlayback {
            _stream: SendableStream(stream),
            finished,
            deadline,
        });
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| {
                active.finished.load(Ordering::SeqCst) || Instant::now() >= active.deadline
            })
    }

    fn stop(&mut self) {
        // Dropping the stream stops it.
        self.active = None;
    }
}
