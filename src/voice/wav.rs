//! PCM to WAV encoding for transcription uploads

use crate::{Error, Result};

/// Capture sample rate (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Convert f32 samples to 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Duration of `samples` at [`SAMPLE_RATE`], in seconds
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_secs(samples: usize) -> f32 {
    samples as f32 / SAMPLE_RATE as f32
}
