//! Shared test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use goku_assistant::config::file::GokuConfigFile;
use goku_assistant::executor::Executor;
use goku_assistant::reasoning::ReasoningBackend;
use goku_assistant::system::{Launcher, SystemSnapshot, Telemetry};
use goku_assistant::voice::SpeechOutput;
use goku_assistant::{Assistant, Config, Error, Interpreter, Result};
use tempfile::TempDir;

/// Reasoning backend with a canned reply
pub struct StubBackend {
    reply: Option<String>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Fails every request as a network error would
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningBackend for StubBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.reply
            .clone()
            .ok_or_else(|| Error::Reasoning("connection refused".to_string()))
    }
}

/// A call made through [`RecordingLauncher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    Url(String),
    Path(PathBuf),
    Program(String),
}

/// Launcher that records calls instead of touching the desktop
#[derive(Default)]
pub struct RecordingLauncher {
    calls: Mutex<Vec<Launch>>,
    missing: Vec<String>,
}

impl RecordingLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Programs in `missing` fail to launch
    pub fn without(missing: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            missing: missing.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    pub fn calls(&self) -> Vec<Launch> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Launch::Url(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

impl Launcher for RecordingLauncher {
    fn open_url(&self, url: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Launch::Url(url.to_string()));
        Ok(())
    }

    fn open_path(&self, path: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(Launch::Path(path.to_path_buf()));
        if path.exists() {
            Ok(())
        } else {
            Err(Error::Launch(format!("{} does not exist", path.display())))
        }
    }

    fn launch(&self, program: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Launch::Program(program.to_string()));
        if self.missing.iter().any(|m| m == program) {
            Err(Error::Launch(format!("{program} not found")))
        } else {
            Ok(())
        }
    }
}

/// Telemetry returning a fixed reading, or failing
pub struct FixedTelemetry(Option<SystemSnapshot>);

impl FixedTelemetry {
    pub fn new(snapshot: SystemSnapshot) -> Arc<Self> {
        Arc::new(Self(Some(snapshot)))
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self(None))
    }
}

impl Telemetry for FixedTelemetry {
    fn snapshot(&self) -> Result<SystemSnapshot> {
        self.0
            .ok_or_else(|| Error::Telemetry("no disks found".to_string()))
    }
}

/// Speech output that remembers what was said
#[derive(Default)]
pub struct RecordingVoice {
    spoken: Mutex<Vec<String>>,
}

impl RecordingVoice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingVoice {
    async fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Sample reading used by stats tests
#[must_use]
pub fn sample_snapshot() -> SystemSnapshot {
    SystemSnapshot {
        cpu: 12.5,
        memory: 48.3,
        memory_used: 7.73,
        memory_total: 16.0,
        disk_used: 120.456,
        disk_free: 379.5,
        disk_total: 500.0,
    }
}

/// Config rooted in a temporary workspace, isolated from the environment
pub fn test_config() -> (Config, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    let workspace = dir.path().join("workspace");
    std::fs::create_dir_all(&workspace).expect("failed to create workspace");

    let mut file = GokuConfigFile::default();
    file.paths.workspace_dir = Some(workspace.display().to_string());
    file.paths.data_dir = Some(dir.path().join("data").display().to_string());
    file.api_keys.gemini = Some("test-key".to_string());

    (Config::from_sources(file, |_| None), dir)
}

/// Executor over recording collaborators
pub fn test_executor(config: &Config, launcher: Arc<RecordingLauncher>) -> Executor {
    Executor::new(
        &config.executor,
        launcher,
        FixedTelemetry::new(sample_snapshot()),
    )
}

/// Assistant wired to stubs
pub fn test_assistant(
    config: &Config,
    backend: Arc<StubBackend>,
    launcher: Arc<RecordingLauncher>,
    voice: Arc<RecordingVoice>,
) -> Assistant {
    let interpreter = Interpreter::new(config, backend);
    let executor = test_executor(config, launcher);
    Assistant::new(config, interpreter, executor, voice)
}
