//! Error types for the Goku assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Reasoning backend returned an error or an unusable reply
    #[error("reasoning backend error: {0}")]
    Reasoning(String),

    /// A bounded call ran past its deadline
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Process, browser or file launch failed
    #[error("launch error: {0}")]
    Launch(String),

    /// System telemetry could not be read
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Capability parameters could not be decoded
    #[error("invalid parameters: {0}")]
    Parameters(String),

    /// Voice output error
    #[error("voice error: {0}")]
    Voice(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
