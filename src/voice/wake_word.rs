//! Wake word detection
//!
//! Local energy detection splits the microphone stream into speech segments;
//! each segment is transcribed and the transcript is matched against the wake
//! word.

/// RMS energy above which a chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech to form a segment (0.3 s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends a segment (0.5 s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating a segment
    Listening,
}

/// Splits audio into utterances and recognises the wake word in transcripts
#[derive(Debug)]
pub struct WakeWordDetector {
    wake_word: String,
    state: DetectorState,
    segment: Vec<f32>,
    voiced: usize,
    silence: usize,
}

impl WakeWordDetector {
    /// Create a detector for `wake_word` (matched case-insensitively)
    #[must_use]
    pub fn new(wake_word: &str) -> Self {
        let wake_word = wake_word.trim().to_lowercase();
        tracing::debug!(wake_word = %wake_word, "wake word detector initialized");

        Self {
            wake_word,
            state: DetectorState::Idle,
            segment: Vec::new(),
            voiced: 0,
            silence: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns true once a segment of speech followed by silence is buffered.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.segment.clear();
                    self.segment.extend_from_slice(samples);
                    self.voiced = samples.len();
                    self.silence = 0;
                    tracing::trace!(energy, "speech detected");
                }
                false
            }
            DetectorState::Listening => {
                self.segment.extend_from_slice(samples);
                if is_speech {
                    self.voiced += samples.len();
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.silence <= SILENCE_SAMPLES {
                    return false;
                }

                if self.voiced > MIN_SPEECH_SAMPLES {
                    tracing::debug!(samples = self.segment.len(), "speech segment complete");
                    return true;
                }

                // A blip too short to be speech
                tracing::trace!(voiced = self.voiced, "discarding short noise");
                self.reset();
                false
            }
        }
    }

    /// Take the buffered segment and return to idle
    pub fn take_segment(&mut self) -> Vec<f32> {
        let segment = std::mem::take(&mut self.segment);
        self.reset();
        segment
    }

    /// Samples buffered for the current segment
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.segment.len()
    }

    /// The command following the wake word, if the transcript contains it
    ///
    /// `Some("")` means the wake word was said on its own.
    #[must_use]
    pub fn match_transcript(&self, transcript: &str) -> Option<String> {
        if self.wake_word.is_empty() || find_ignore_case(transcript, &self.wake_word).is_none() {
            return None;
        }

        tracing::info!(wake_word = %self.wake_word, transcript, "wake word detected");
        Some(extract_command(transcript, &self.wake_word))
    }

    /// Return to idle, dropping any buffered audio
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.segment.clear();
        self.voiced = 0;
        self.silence = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Configured wake word, lower-case
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }
}

/// Text after the wake word, without leading punctuation
///
/// Returns the whole transcript if the wake word is absent.
#[must_use]
pub fn extract_command(transcript: &str, wake_word: &str) -> String {
    find_ignore_case(transcript, wake_word.trim()).map_or_else(
        || transcript.trim().to_string(),
        |(_, end)| {
            transcript[end..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.' || c == '!')
                .trim_end()
                .to_string()
        },
    )
}

/// Byte range of the first case-insensitive match of `needle` in `haystack`
///
/// Offsets index `haystack` itself, so they stay on char boundaries even
/// where lower-casing changes a character's length.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let wanted: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();

    haystack.char_indices().find_map(|(start, _)| {
        let mut matched = 0;
        for (offset, c) in haystack[start..].char_indices() {
            let lower: Vec<char> = c.to_lowercase().collect();
            if wanted.get(matched..matched + lower.len()) != Some(lower.as_slice()) {
                return None;
            }
            matched += lower.len();
            if matched == wanted.len() {
                return Some((start, start + offset + c.len_utf8()));
            }
        }
        None
    })
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        assert!(calculate_energy(&[0.0; 100]) < 0.001);
        assert!(calculate_energy(&[0.5; 100]) > 0.4);
        assert!(calculate_energy(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_segment_completes_after_trailing_silence() {
        let mut detector = WakeWordDetector::new("hey goku");
        let speech = vec![0.3f32; 1600];
        let silence = vec![0.0f32; 1600];

        assert!(!detector.process(&silence));
        assert_eq!(detector.state(), DetectorState::Idle);

        for _ in 0..4 {
            assert!(!detector.process(&speech));
        }
        assert_eq!(detector.state(), DetectorState::Listening);

        let mut complete = false;
        for _ in 0..6 {
            complete = detector.process(&silence);
            if complete {
                break;
            }
        }
        assert!(complete);

        let segment = detector.take_segment();
        assert!(segment.len() > MIN_SPEECH_SAMPLES);
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.buffered(), 0);
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut detector = WakeWordDetector::new("hey goku");
        assert!(!detector.process(&[0.5f32; 160]));
        for _ in 0..12 {
            assert!(!detector.process(&[0.0f32; 1600]));
        }
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn test_match_transcript() {
        let detector = WakeWordDetector::new("  Hey Goku ");
        assert_eq!(detector.wake_word(), "hey goku");

        assert_eq!(detector.match_transcript("hello world"), None);
        assert_eq!(
            detector.match_transcript("Hey Goku, open notepad."),
            Some("open notepad.".to_string())
        );
        assert_eq!(detector.match_transcript("hey goku"), Some(String::new()));
    }

    #[test]
    fn test_extract_command() {
        assert_eq!(
            extract_command("Hey Goku, what's the weather?", "hey goku"),
            "what's the weather?"
        );
        assert_eq!(extract_command("Hey Goku", "hey goku"), "");
        assert_eq!(extract_command("  open chrome ", "hey goku"), "open chrome");
    }

    #[test]
    fn test_extract_command_after_length_changing_text() {
        // 'İ' lower-cases to two chars, shifting lower-case byte offsets
        assert_eq!(
            extract_command("İİİ hey goku, open notepad", "hey goku"),
            "open notepad"
        );
        assert_eq!(extract_command("HEY GOKU İstanbul", "hey goku"), "İstanbul");
        assert_eq!(find_ignore_case("aİb", "i\u{307}b"), Some((1, 4)));
        assert_eq!(find_ignore_case("hey", ""), None);
    }
}
