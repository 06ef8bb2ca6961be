//! Voice input and output
//!
//! Speech output goes through the platform TTS command. Input is typed text
//! by default; the `microphone` feature adds capture, wake word detection and
//! Whisper transcription.

#[cfg(feature = "microphone")]
mod capture;
mod input;
mod speech;
mod stt;
mod wake_word;
mod wav;

#[cfg(feature = "microphone")]
pub use capture::{AudioCapture, record_segment};
#[cfg(feature = "microphone")]
pub use input::MicrophoneInput;
pub use input::{ConsoleInput, SpeechInput};
pub use speech::{ConsoleVoice, SpeechOutput, SystemVoice};
pub use stt::SpeechToText;
pub use wake_word::{DetectorState, WakeWordDetector, extract_command};
pub use wav::{SAMPLE_RATE, duration_secs, samples_to_wav};
