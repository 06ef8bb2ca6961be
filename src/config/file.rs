//! TOML configuration file loading
//!
//! Supports `~/.config/goku/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GokuConfigFile {
    /// Assistant identity and activation
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Reasoning backend configuration
    #[serde(default)]
    pub reasoning: ReasoningFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Data and workspace locations
    #[serde(default)]
    pub paths: PathsFileConfig,

    /// Extra known applications: spoken name -> executable
    #[serde(default)]
    pub apps: BTreeMap<String, String>,
}

/// Assistant identity and activation settings
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssistantFileConfig {
    /// Name the assistant answers to (e.g. "Goku")
    pub name: Option<String>,

    /// Spoken wake word (e.g. "hey goku")
    pub wake_word: Option<String>,

    /// Max seconds between two hotkey presses to count as a double press
    pub double_press_window: Option<f64>,

    /// Seconds to wait for speech to start
    pub listen_timeout: Option<u64>,

    /// Max seconds for one spoken phrase
    pub phrase_limit: Option<u64>,
}

/// Reasoning backend configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReasoningFileConfig {
    /// Provider ("gemini", "openai")
    pub provider: Option<String>,

    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Speak responses aloud
    pub enabled: Option<bool>,

    /// Speech rate in words per minute
    pub rate: Option<u32>,

    /// Volume from 0.0 to 1.0
    pub volume: Option<f32>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub openai: Option<String>,
}

/// Filesystem locations
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PathsFileConfig {
    /// Directory for the notes log
    pub data_dir: Option<String>,

    /// Base directory for relative file and folder paths
    pub workspace_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GokuConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> GokuConfigFile {
    config_file_path().map_or_else(GokuConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `GokuConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_from(path: &Path) -> GokuConfigFile {
    if !path.exists() {
        return GokuConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                GokuConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            GokuConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/goku/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("goku").join("config.toml"))
}
