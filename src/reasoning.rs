//! Reasoning backend: the remote language model consulted for interpretation
//! and chat
//!
//! The backend takes one prompt and returns one text blob. Calls are bounded by
//! the configured timeout and never retried.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;
use crate::{Error, Result};

/// Prompt in, free-form text out
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send one prompt and return the model's reply text
    ///
    /// # Errors
    ///
    /// Returns error on network failure, timeout, non-success status or an
    /// empty reply
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Hosted model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// Any OpenAI-compatible `chat/completions` endpoint
    OpenAi,
}

impl Provider {
    /// Parse a provider name, `None` if unrecognised
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "openai-compatible" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Default model for this provider
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// Default API base URL for this provider
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Environment variable holding this provider's key
    #[must_use]
    pub const fn key_env(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::OpenAi => f.write_str("openai"),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReplyContent>,
}

#[derive(Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Deserialize)]
struct GeminiReplyPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Reasoning backend reached over HTTPS
pub struct HttpBackend {
    client: reqwest::Client,
    provider: Provider,
    api_key: SecretString,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend from configuration
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured or the HTTP client cannot be built
    pub fn new(config: &ReasoningConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::Config(format!(
                "{} not set; add it to your environment, .env or config.toml",
                config.provider.key_env()
            ))
        })?;

        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(format!(
                "{} is empty",
                config.provider.key_env()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            timeout = ?config.timeout,
            "reasoning backend initialized"
        );

        Ok(Self {
            client,
            provider: config.provider,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    async fn generate_gemini(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GeminiRequest {
            contents: [GeminiContent {
                role: "user",
                parts: [GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Reasoning(format!("Gemini API error {status}")));
        }

        let reply: GeminiResponse = response.json().await.map_err(|e| self.request_error(e))?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(text)
    }

    async fn generate_openai(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::Reasoning(format!("chat completion API error {status}")));
        }

        let reply: ChatCompletionResponse =
            response.json().await.map_err(|e| self.request_error(e))?;

        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Http(e)
        }
    }
}

#[async_trait]
impl ReasoningBackend for HttpBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(provider = %self.provider, prompt_len = prompt.len(), "calling reasoning backend");

        let text = match self.provider {
            Provider::Gemini => self.generate_gemini(prompt).await?,
            Provider::OpenAi => self.generate_openai(prompt).await?,
        };

        if text.trim().is_empty() {
            return Err(Error::Reasoning("empty reply".to_string()));
        }

        tracing::debug!(reply_len = text.len(), "reasoning backend replied");
        Ok(text)
    }
}
