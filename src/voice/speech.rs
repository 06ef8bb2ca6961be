//! Speech output through the platform's text-to-speech command

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::VoiceConfig;

/// Says things to the user
///
/// Implementations never fail: problems are logged and the text is dropped.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text` and wait until it has been said
    async fn speak(&self, text: &str);
}

/// Prints replies instead of speaking them
#[derive(Debug, Clone)]
pub struct ConsoleVoice {
    name: String,
}

impl ConsoleVoice {
    /// Create a console voice labelled with the assistant's name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl SpeechOutput for ConsoleVoice {
    async fn speak(&self, text: &str) {
        println!("{}: {text}", self.name);
    }
}

/// Text-to-speech program found on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
enum Engine {
    /// `espeak` / `espeak-ng`
    Espeak(PathBuf),
    /// speech-dispatcher's `spd-say`
    SpdSay(PathBuf),
    /// macOS `say`
    Say,
    /// Windows SAPI through PowerShell
    Sapi,
}

/// Speaks through the platform TTS command and echoes to the console
#[derive(Debug, Clone)]
pub struct SystemVoice {
    console: ConsoleVoice,
    engine: Option<Engine>,
    rate: u32,
    volume: f32,
}

impl SystemVoice {
    /// Find a TTS program and apply the configured rate and volume
    ///
    /// Falls back to console output if none is installed.
    #[must_use]
    pub fn detect(name: &str, config: &VoiceConfig) -> Self {
        let engine = detect_engine();
        match &engine {
            Some(engine) => tracing::debug!(?engine, rate = config.rate, volume = config.volume, "tts engine selected"),
            None => tracing::warn!("no text-to-speech program found, replies will only be printed"),
        }

        Self {
            console: ConsoleVoice::new(name),
            engine,
            rate: config.rate,
            volume: config.volume,
        }
    }

    /// Whether a TTS program was found
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    async fn say(&self, engine: &Engine, text: &str) -> std::io::Result<std::process::ExitStatus> {
        let (mut cmd, stdin_text) = build_command(engine, text, self.rate, self.volume);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        match stdin_text {
            Some(body) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn()?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(body.as_bytes()).await?;
                }
                child.wait().await
            }
            None => cmd.stdin(Stdio::null()).status().await,
        }
    }
}

#[async_trait]
impl SpeechOutput for SystemVoice {
    async fn speak(&self, text: &str) {
        self.console.speak(text).await;

        let Some(engine) = &self.engine else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        match self.say(engine, text).await {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!(%status, "text-to-speech exited with failure"),
            Err(e) => tracing::warn!(error = %e, "text-to-speech failed"),
        }
    }
}

#[cfg(target_os = "windows")]
fn detect_engine() -> Option<Engine> {
    Some(Engine::Sapi)
}

#[cfg(target_os = "macos")]
fn detect_engine() -> Option<Engine> {
    Some(Engine::Say)
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn detect_engine() -> Option<Engine> {
    ["espeak-ng", "espeak"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
        .map(Engine::Espeak)
        .or_else(|| which::which("spd-say").ok().map(Engine::SpdSay))
}

/// Build the command for `engine`; the second value is text to pipe to stdin
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn build_command(engine: &Engine, text: &str, rate: u32, volume: f32) -> (Command, Option<String>) {
    let volume = volume.clamp(0.0, 1.0);

    match engine {
        Engine::Espeak(path) => {
            let mut cmd = Command::new(path);
            cmd.arg("-s")
                .arg(rate.to_string())
                .arg("-a")
                .arg(((volume * 100.0).round() as u32).to_string())
                .arg("--")
                .arg(text);
            (cmd, None)
        }
        Engine::SpdSay(path) => {
            // spd-say takes rate and volume as -100..=100 around its defaults
            let rate = ((i64::from(rate) - 180) / 2).clamp(-100, 100);
            let volume = ((volume * 200.0).round() as i64 - 100).clamp(-100, 100);
            let mut cmd = Command::new(path);
            cmd.arg("--wait")
                .arg("-r")
                .arg(rate.to_string())
                .arg("-i")
                .arg(volume.to_string())
                .arg("--")
                .arg(text);
            (cmd, None)
        }
        Engine::Say => {
            let mut cmd = Command::new("say");
            cmd.arg("-r")
                .arg(rate.to_string())
                .arg(format!("[[volm {volume:.2}]] {text}"));
            (cmd, None)
        }
        Engine::Sapi => {
            let sapi_rate = ((i64::from(rate) - 180) / 20).clamp(-10, 10);
            let sapi_volume = (volume * 100.0).round() as u32;
            let script = format!(
                "Add-Type -AssemblyName System.Speech; \
                 $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                 $s.Rate = {sapi_rate}; $s.Volume = {sapi_volume}; \
                 $s.Speak([Console]::In.ReadToEnd())"
            );
            let mut cmd = Command::new("powershell");
            cmd.args(["-NoProfile", "-NonInteractive", "-Command", &script]);
            (cmd, Some(text.to_string()))
        }
    }
}
