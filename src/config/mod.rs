//! Configuration management for the Goku assistant
//!
//! Built once at startup and handed to the interpreter, executor and
//! assistant constructors. Priority: environment (including `.env`) > TOML
//! file > defaults.

pub mod file;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::reasoning::Provider;
use file::GokuConfigFile;

/// Default assistant name
pub const DEFAULT_NAME: &str = "Goku";

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "hey goku";

/// Goku assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity and activation
    pub assistant: AssistantConfig,

    /// Reasoning backend
    pub reasoning: ReasoningConfig,

    /// Speech input/output
    pub voice: VoiceConfig,

    /// Capability handlers
    pub executor: ExecutorConfig,

    /// Path to data directory (notes log)
    pub data_dir: PathBuf,
}

/// Assistant identity and activation settings
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Name used in prompts and greetings
    pub name: String,

    /// Spoken wake word, lower-case
    pub wake_word: String,

    /// Max gap between two hotkey presses for a double press
    pub double_press_window: Duration,

    /// How long to wait for speech to start
    pub listen_timeout: Duration,

    /// Max length of one spoken phrase
    pub phrase_limit: Duration,
}

/// Reasoning backend configuration
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// Hosted provider
    pub provider: Provider,

    /// API key for the provider
    pub api_key: Option<SecretString>,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Speak responses aloud (otherwise print only)
    pub enabled: bool,

    /// Speech rate in words per minute
    pub rate: u32,

    /// Volume from 0.0 to 1.0
    pub volume: f32,

    /// STT model for microphone input
    pub stt_model: String,

    /// `OpenAI` key for Whisper transcription
    pub stt_api_key: Option<SecretString>,
}

/// Capability handler configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base directory for relative paths
    pub workspace_dir: PathBuf,

    /// Append-only notes log
    pub notes_path: PathBuf,

    /// Known applications added on top of the platform table
    pub extra_apps: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from `.env`, the process environment and the TOML file
    #[must_use]
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    #[must_use]
    #[allow(clippy::needless_pass_by_value, clippy::too_many_lines)]
    pub fn from_sources(fc: GokuConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Assistant (env > toml > default)
        let assistant = AssistantConfig {
            name: non_empty("GOKU_NAME")
                .or(fc.assistant.name)
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            wake_word: non_empty("GOKU_WAKE_WORD")
                .or_else(|| non_empty("WAKE_WORD"))
                .or(fc.assistant.wake_word)
                .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string())
                .trim()
                .to_lowercase(),
            double_press_window: non_empty("DOUBLE_PRESS_WINDOW")
                .and_then(|s| s.parse::<f64>().ok())
                .or(fc.assistant.double_press_window)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(Duration::from_millis(500)),
            listen_timeout: non_empty("GOKU_LISTEN_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .or(fc.assistant.listen_timeout)
                .map_or(Duration::from_secs(10), Duration::from_secs),
            phrase_limit: non_empty("GOKU_PHRASE_LIMIT")
                .and_then(|s| s.parse().ok())
                .or(fc.assistant.phrase_limit)
                .map_or(Duration::from_secs(15), Duration::from_secs),
        };

        // Reasoning backend (env > toml > provider default)
        let provider_name = non_empty("GOKU_PROVIDER").or(fc.reasoning.provider);
        let provider = provider_name
            .as_deref()
            .map_or(Some(Provider::default()), Provider::from_name)
            .unwrap_or_else(|| {
                tracing::warn!(provider = ?provider_name, "unknown reasoning provider, using gemini");
                Provider::default()
            });

        let gemini_key = non_empty("GEMINI_API_KEY").or(fc.api_keys.gemini);
        let openai_key = non_empty("OPENAI_API_KEY").or(fc.api_keys.openai);

        let reasoning = ReasoningConfig {
            provider,
            api_key: match provider {
                Provider::Gemini => gemini_key,
                Provider::OpenAi => openai_key.clone(),
            }
            .map(SecretString::from),
            model: non_empty("GOKU_MODEL")
                .or(fc.reasoning.model)
                .unwrap_or_else(|| provider.default_model().to_string()),
            base_url: non_empty("GOKU_REASONING_URL")
                .or(fc.reasoning.base_url)
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            timeout: non_empty("GOKU_REASONING_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .or(fc.reasoning.timeout_secs)
                .map_or(Duration::from_secs(30), Duration::from_secs),
        };

        // Voice (env > toml > default)
        let voice = VoiceConfig {
            enabled: non_empty("GOKU_VOICE_ENABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.voice.enabled)
                .unwrap_or(true),
            rate: non_empty("VOICE_RATE")
                .and_then(|s| s.parse().ok())
                .or(fc.voice.rate)
                .unwrap_or(180),
            volume: non_empty("VOICE_VOLUME")
                .and_then(|s| s.parse().ok())
                .or(fc.voice.volume)
                .unwrap_or(0.9)
                .clamp(0.0, 1.0),
            stt_model: non_empty("GOKU_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            stt_api_key: openai_key.map(SecretString::from),
        };

        // Data directory (~/.local/share/goku on Linux)
        let data_dir = non_empty("GOKU_DATA_DIR")
            .or(fc.paths.data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                directories::BaseDirs::new()
                    .map_or_else(|| PathBuf::from("data"), |d| d.data_dir().join("goku"))
            });

        let workspace_dir = non_empty("GOKU_WORKSPACE_DIR")
            .or(fc.paths.workspace_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let executor = ExecutorConfig {
            workspace_dir,
            notes_path: data_dir.join("notes.txt"),
            extra_apps: fc
                .apps
                .into_iter()
                .map(|(name, exe)| (name.trim().to_lowercase(), exe))
                .collect(),
        };

        Self {
            assistant,
            reasoning,
            voice,
            executor,
            data_dir,
        }
    }
}
