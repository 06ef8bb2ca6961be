//! Speech input: where commands come from

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Produces one command per call
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Wait up to `timeout` for a command lasting at most `phrase_limit`
    ///
    /// Returns `None` if nothing usable was heard.
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Option<String>;
}

/// Commands typed on a line-oriented reader (stdin by default)
pub struct ConsoleInput<R = BufReader<Stdin>> {
    reader: Mutex<R>,
}

impl ConsoleInput {
    /// Read commands from standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleInput<R> {
    /// Read commands from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }

    /// Next line, trimmed; `None` at end of input
    pub async fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        let mut reader = self.reader.lock().await;

        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                None
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> SpeechInput for ConsoleInput<R> {
    async fn listen(&self, timeout: Duration, _phrase_limit: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.read_line()).await {
            Ok(line) => line.filter(|l| !l.is_empty()),
            Err(_) => {
                tracing::debug!(?timeout, "no input before timeout");
                None
            }
        }
    }
}

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneInput;

#[cfg(feature = "microphone")]
mod microphone {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::SpeechInput;
    use crate::config::VoiceConfig;
    use crate::voice::capture::record_segment;
    use crate::voice::stt::SpeechToText;
    use crate::voice::wake_word::WakeWordDetector;
    use crate::voice::wav::{SAMPLE_RATE, duration_secs, samples_to_wav};
    use crate::{Error, Result};

    /// Microphone capture transcribed with Whisper
    pub struct MicrophoneInput {
        stt: SpeechToText,
    }

    impl MicrophoneInput {
        /// Create microphone input
        ///
        /// # Errors
        ///
        /// Returns error if no `OpenAI` key is configured for transcription
        pub fn new(config: &VoiceConfig, request_timeout: Duration) -> Result<Self> {
            let stt = SpeechToText::new(config.stt_api_key.as_ref(), &config.stt_model, request_timeout)?;
            Ok(Self { stt })
        }

        /// Record the next utterance on a blocking thread
        ///
        /// The detector is handed back so its state survives between calls.
        pub async fn next_segment(
            &self,
            mut detector: WakeWordDetector,
            max_wait: Option<Duration>,
            phrase_limit: Duration,
            stop: Arc<AtomicBool>,
        ) -> (WakeWordDetector, Result<Option<Vec<f32>>>) {
            let wake_word = detector.wake_word().to_string();
            let joined = tokio::task::spawn_blocking(move || {
                let segment = record_segment(&mut detector, max_wait, phrase_limit, &stop);
                (detector, segment)
            })
            .await;

            joined.unwrap_or_else(|e| {
                (
                    WakeWordDetector::new(&wake_word),
                    Err(Error::Audio(format!("capture task failed: {e}"))),
                )
            })
        }

        /// Transcribe a recorded segment; `None` if empty or on error
        pub async fn transcribe(&self, samples: &[f32]) -> Option<String> {
            tracing::debug!(seconds = duration_secs(samples.len()), "transcribing segment");

            let wav = match samples_to_wav(samples, SAMPLE_RATE) {
                Ok(wav) => wav,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode audio");
                    return None;
                }
            };

            match self.stt.transcribe(&wav).await {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!(error = %e, "transcription failed");
                    None
                }
            }
        }
    }

    #[async_trait]
    impl SpeechInput for MicrophoneInput {
        async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Option<String> {
            let stop = Arc::new(AtomicBool::new(false));
            let (_, segment) = self
                .next_segment(WakeWordDetector::new(""), Some(timeout), phrase_limit, stop)
                .await;

            match segment {
                Ok(Some(samples)) => self.transcribe(&samples).await,
                Ok(None) => None,
                Err(e) => {
                    tracing::error!(error = %e, "audio capture failed");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_input_reads_lines_until_eof() {
        let input = ConsoleInput::from_reader(&b"open notepad\n\n  take a note  \n"[..]);

        assert_eq!(input.read_line().await.as_deref(), Some("open notepad"));
        assert_eq!(input.read_line().await.as_deref(), Some(""));
        assert_eq!(input.read_line().await.as_deref(), Some("take a note"));
        assert_eq!(input.read_line().await, None);
    }

    #[tokio::test]
    async fn test_listen_skips_blank_lines_as_nothing_heard() {
        let input = ConsoleInput::from_reader(&b"\nsearch rust\n"[..]);
        let timeout = Duration::from_secs(1);

        assert_eq!(input.listen(timeout, timeout).await, None);
        assert_eq!(input.listen(timeout, timeout).await.as_deref(), Some("search rust"));
        assert_eq!(input.listen(timeout, timeout).await, None);
    }
}
