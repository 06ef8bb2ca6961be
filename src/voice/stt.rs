//! Speech-to-text through the `OpenAI` Whisper transcription API

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes recorded speech
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl SpeechToText {
    /// Create a Whisper client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: Option<&SecretString>, model: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().trim().is_empty())
            .cloned()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY required for speech recognition".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}")));
        }

        let result: WhisperResponse = response.json().await?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text.trim().to_string())
    }
}
