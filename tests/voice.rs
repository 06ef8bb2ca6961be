//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::time::Duration;

use goku_assistant::voice::{
    ConsoleInput, DetectorState, SAMPLE_RATE, SpeechInput, WakeWordDetector, duration_secs,
    extract_command, samples_to_wav,
};

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

#[test]
fn test_wake_word_detector_creation() {
    let detector = WakeWordDetector::new("  Hey GOKU ");

    assert_eq!(detector.state(), DetectorState::Idle);
    assert_eq!(detector.wake_word(), "hey goku");
    assert_eq!(detector.buffered(), 0);
}

#[test]
fn test_wake_word_case_insensitive() {
    let detector = WakeWordDetector::new("hey goku");

    assert_eq!(detector.match_transcript("HEY GOKU").as_deref(), Some(""));
    assert_eq!(
        detector.match_transcript("HeY gOkU, open notepad").as_deref(),
        Some("open notepad")
    );
    assert_eq!(detector.match_transcript("hello world"), None);
}

#[test]
fn test_speech_activity_detection() {
    let mut detector = WakeWordDetector::new("hey goku");

    // Silent samples - should not trigger
    assert!(!detector.process(&generate_silence(0.1)));
    assert_eq!(detector.state(), DetectorState::Idle);

    // Loud samples - should start listening
    assert!(!detector.process(&generate_sine_samples(440.0, 0.5, 0.3)));
    assert_eq!(detector.state(), DetectorState::Listening);

    // Trailing silence completes the segment
    assert!(detector.process(&generate_silence(0.6)));
}

#[test]
fn test_short_noise_is_discarded() {
    let mut detector = WakeWordDetector::new("hey goku");

    detector.process(&generate_sine_samples(440.0, 0.1, 0.3));
    assert_eq!(detector.state(), DetectorState::Listening);

    assert!(!detector.process(&generate_silence(0.6)));
    assert_eq!(detector.state(), DetectorState::Idle);
    assert_eq!(detector.buffered(), 0);
}

#[test]
fn test_take_segment() {
    let mut detector = WakeWordDetector::new("hey goku");

    let chunk1 = generate_sine_samples(440.0, 0.1, 0.3);
    let chunk2 = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&chunk1);
    detector.process(&chunk2);
    assert_eq!(detector.buffered(), chunk1.len() + chunk2.len());

    let taken = detector.take_segment();
    assert_eq!(taken.len(), chunk1.len() + chunk2.len());

    // Buffer should be empty after take
    assert_eq!(detector.buffered(), 0);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_extract_command_variants() {
    assert_eq!(extract_command("Hey Goku, what's the weather?", "hey goku"), "what's the weather?");
    assert_eq!(extract_command("hey goku. take a note", "hey goku"), "take a note");
    assert_eq!(extract_command("Hey Goku!", "hey goku"), "");
    assert_eq!(extract_command("  open notepad ", "hey goku"), "open notepad");
}

#[test]
fn test_wake_word_after_non_ascii_text() {
    let detector = WakeWordDetector::new("hey goku");

    assert_eq!(
        detector.match_transcript("İyi günler HEY GOKU, open notepad").as_deref(),
        Some("open notepad")
    );
    assert_eq!(extract_command("ẞẞ Hey Goku take a note", "hey goku"), "take a note");
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // 44-byte header plus two bytes per sample
    assert_eq!(wav_data.len(), 44 + samples.len() * 2);
}

#[test]
fn test_wav_clamps_out_of_range_samples() {
    let wav_data = samples_to_wav(&[0.0, 2.0, -2.0], SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, vec![0, i16::MAX, -i16::MAX]);
}

#[test]
fn test_duration() {
    assert!((duration_secs(16_000) - 1.0).abs() < f32::EPSILON);
    assert!((duration_secs(8_000) - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_console_input_listens_for_one_command() {
    let input = ConsoleInput::from_reader(&b"  Hey Goku, open calculator  \n"[..]);
    let timeout = Duration::from_secs(1);

    let heard = tokio_test::block_on(input.listen(timeout, timeout));
    assert_eq!(heard.as_deref(), Some("Hey Goku, open calculator"));

    let command = heard.map(|t| extract_command(&t, "hey goku"));
    assert_eq!(command.as_deref(), Some("open calculator"));

    // End of input
    assert_eq!(tokio_test::block_on(input.listen(timeout, timeout)), None);
}
