//! Interactive first-run setup wizard (`goku setup`)

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    ApiKeysFileConfig, AssistantFileConfig, GokuConfigFile, ReasoningFileConfig, VoiceFileConfig,
    config_file_path, load_config_file,
};
use crate::config::{DEFAULT_NAME, DEFAULT_WAKE_WORD};
use crate::reasoning::Provider;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Goku Setup\n");

    let existing = load_config_file();
    let config_path =
        config_file_path().unwrap_or_else(|| PathBuf::from("~/.config/goku/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Identity
    let name: String = Input::new()
        .with_prompt("Assistant name")
        .default(existing.assistant.name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string()))
        .interact_text()?;

    let wake_word: String = Input::new()
        .with_prompt("Wake word")
        .default(
            existing
                .assistant
                .wake_word
                .clone()
                .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string()),
        )
        .interact_text()?;

    // 2. Reasoning provider + API key
    let providers = [Provider::Gemini, Provider::OpenAi];
    let labels = ["Gemini", "OpenAI"];
    let default_provider = existing
        .reasoning
        .provider
        .as_deref()
        .and_then(Provider::from_name)
        .and_then(|p| providers.iter().position(|&q| q == p))
        .unwrap_or(0);

    let provider_idx = Select::new()
        .with_prompt("Select a reasoning provider")
        .items(&labels)
        .default(default_provider)
        .interact()?;
    let provider = providers[provider_idx];

    let mut api_keys = existing.api_keys;
    let key = prompt_key(provider, key_slot(&mut api_keys, provider).as_deref())?;
    *key_slot(&mut api_keys, provider) = key;

    let model: String = Input::new()
        .with_prompt("Model")
        .default(
            existing
                .reasoning
                .model
                .clone()
                .filter(|_| existing.reasoning.provider.as_deref().and_then(Provider::from_name) == Some(provider))
                .unwrap_or_else(|| provider.default_model().to_string()),
        )
        .interact_text()?;

    // 3. Voice
    let enable_voice = Confirm::new()
        .with_prompt("Speak replies aloud?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let rate: u32 = Input::new()
        .with_prompt("Speech rate (words per minute)")
        .default(existing.voice.rate.unwrap_or(180))
        .interact_text()?;

    if api_keys.openai.is_none() && provider != Provider::OpenAi {
        let add_openai = Confirm::new()
            .with_prompt("Microphone input uses OpenAI Whisper. Add an OpenAI key?")
            .default(false)
            .interact()?;

        if add_openai {
            api_keys.openai = prompt_key(Provider::OpenAi, None)?;
        }
    }

    // 4. Build and write config
    let config_file = GokuConfigFile {
        assistant: AssistantFileConfig {
            name: Some(name),
            wake_word: Some(wake_word),
            ..existing.assistant
        },
        reasoning: ReasoningFileConfig {
            provider: Some(provider.to_string()),
            model: Some(model),
            ..existing.reasoning
        },
        voice: VoiceFileConfig {
            enabled: Some(enable_voice),
            rate: Some(rate),
            ..existing.voice
        },
        api_keys,
        paths: existing.paths,
        apps: existing.apps,
    };

    write_config(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `goku --text` to start typing commands.");

    Ok(())
}

fn key_slot(keys: &mut ApiKeysFileConfig, provider: Provider) -> &mut Option<String> {
    match provider {
        Provider::Gemini => &mut keys.gemini,
        Provider::OpenAi => &mut keys.openai,
    }
}

/// Ask for a key, keeping `current` when left blank
fn prompt_key(provider: Provider, current: Option<&str>) -> anyhow::Result<Option<String>> {
    let prompt = current.map_or_else(
        || format!("{provider} API key ({})", provider.key_env()),
        |k| format!("{provider} API key (current: {}, leave blank to keep)", mask(k)),
    );

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        current.map(str::to_string)
    } else {
        Some(input.to_string())
    })
}

/// Show only the ends of a secret
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Serialize and write the config file
fn write_config(path: &Path, config: &GokuConfigFile) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
