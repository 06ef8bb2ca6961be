//! Audio capture from the microphone

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::wake_word::{DetectorState, WakeWordDetector};
use super::wav::SAMPLE_RATE;
use crate::{Error, Result};

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captures audio from the default input device
///
/// Holds a live `cpal` stream, so it stays on the thread that created it.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at 16kHz mono
    ///
    /// # Errors
    ///
    /// Returns error if no suitable input device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no 16kHz mono input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("audio capture stopped");
        }
    }

    /// Samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Record one utterance, blocking the calling thread
///
/// Gives up with `Ok(None)` if no speech starts within `max_wait` (forever
/// when `None`) or `stop` is raised. A segment still going after
/// `phrase_limit` is cut there.
///
/// # Errors
///
/// Returns error if the microphone cannot be opened
pub fn record_segment(
    detector: &mut WakeWordDetector,
    max_wait: Option<Duration>,
    phrase_limit: Duration,
    stop: &AtomicBool,
) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;
    detector.reset();

    let started = Instant::now();
    let mut speaking_since: Option<Instant> = None;

    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }

        std::thread::sleep(POLL_INTERVAL);
        let samples = capture.take_buffer();

        if detector.process(&samples) {
            return Ok(Some(detector.take_segment()));
        }

        match detector.state() {
            DetectorState::Idle => {
                speaking_since = None;
                if max_wait.is_some_and(|wait| started.elapsed() >= wait) {
                    tracing::debug!(waited = ?started.elapsed(), "no speech before timeout");
                    return Ok(None);
                }
            }
            DetectorState::Listening => {
                let since = *speaking_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= phrase_limit {
                    tracing::debug!("phrase limit reached");
                    return Ok(Some(detector.take_segment()));
                }
            }
        }
    }
}
