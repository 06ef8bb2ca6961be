use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use goku_assistant::executor::{AppTable, Executor, NotesLog};
use goku_assistant::intent::{Action, Intent};
use goku_assistant::system::{SysinfoTelemetry, SystemLauncher};
use goku_assistant::voice::{ConsoleInput, SpeechOutput, SystemVoice};
use goku_assistant::{Assistant, Config};

/// Goku - desktop voice assistant
#[derive(Parser)]
#[command(name = "goku", version, about)]
struct Cli {
    /// Type commands instead of speaking them
    #[arg(long, env = "GOKU_TEXT_MODE")]
    text: bool,

    /// Print replies without speaking them
    #[arg(long)]
    mute: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single command and exit
    Ask {
        /// The command, e.g. "open notepad"
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Chat without running any action
    Chat {
        /// Message to send
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Show CPU, memory and storage usage
    Stats,
    /// Show recent notes
    Notes {
        /// Number of notes to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
    /// List known applications
    Apps,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,goku_assistant=info",
        1 => "info,goku_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Some(Command::Setup)) {
        return goku_assistant::setup::run_setup();
    }

    let mut config = Config::load();
    if cli.mute {
        config.voice.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Ask { words }) => {
            let assistant = Assistant::from_config(&config)?;
            assistant.handle(&words.join(" ")).await;
            Ok(())
        }
        Some(Command::Chat { words }) => {
            let assistant = Assistant::from_config(&config)?;
            assistant.chat(&words.join(" ")).await;
            Ok(())
        }
        Some(Command::Stats) => {
            show_stats(&config);
            Ok(())
        }
        Some(Command::Notes { count }) => show_notes(&config, count),
        Some(Command::Apps) => {
            for (name, exe) in AppTable::new(&config.executor.extra_apps).iter() {
                println!("{name:<12} {exe}");
            }
            Ok(())
        }
        Some(Command::TestTts { text }) => {
            test_tts(&config, &text).await;
            Ok(())
        }
        Some(Command::Setup) => Ok(()),
        None => run_interactive(&config, cli.text).await,
    }
}

#[allow(clippy::future_not_send)]
async fn run_interactive(config: &Config, text_mode: bool) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    tracing::info!(name = assistant.name(), text_mode, "starting assistant");

    if text_mode {
        assistant.run_text(&ConsoleInput::stdin()).await;
        Ok(())
    } else {
        run_voice(&assistant, config).await
    }
}

#[cfg(feature = "microphone")]
async fn run_voice(assistant: &Assistant, config: &Config) -> anyhow::Result<()> {
    let mic = goku_assistant::voice::MicrophoneInput::new(&config.voice, config.reasoning.timeout)?;
    assistant.run_voice(&mic).await?;
    Ok(())
}

#[cfg(not(feature = "microphone"))]
async fn run_voice(assistant: &Assistant, _config: &Config) -> anyhow::Result<()> {
    tracing::warn!("built without the microphone feature, falling back to text mode");
    assistant.run_text(&ConsoleInput::stdin()).await;
    Ok(())
}

/// Report system stats through the same handler voice commands use
fn show_stats(config: &Config) {
    let executor = Executor::new(
        &config.executor,
        Arc::new(SystemLauncher::new()),
        Arc::new(SysinfoTelemetry::new(&config.executor.workspace_dir)),
    );

    let outcome = executor.execute(&Intent::new(
        Action::SystemStats,
        serde_json::Map::new(),
        "",
    ));
    println!("{}", outcome.message);
}

fn show_notes(config: &Config, count: usize) -> anyhow::Result<()> {
    let log = NotesLog::new(&config.executor.notes_path);
    let notes = log.recent(count)?;

    if notes.is_empty() {
        println!("No notes yet ({})", log.path().display());
    }
    for note in notes {
        println!("{note}");
    }

    Ok(())
}

async fn test_tts(config: &Config, text: &str) {
    println!("Testing TTS with text: \"{text}\"\n");

    let voice = SystemVoice::detect(&config.assistant.name, &config.voice);
    if !voice.is_available() {
        println!("No text-to-speech program found.");
        println!("Install espeak-ng or speech-dispatcher (spd-say) and try again.");
        return;
    }

    voice.speak(text).await;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
}
