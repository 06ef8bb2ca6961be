//! Capability execution
//!
//! [`Executor::execute`] decodes an [`Intent`] into a [`Command`], runs exactly
//! one handler and reports an [`Outcome`]. Failures a handler anticipates come
//! back as specific sentences; anything else is caught at the dispatch
//! boundary and reported as `Execution error: …`.

mod apps;
mod notes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use apps::AppTable;
pub use notes::NotesLog;

use crate::Result;
use crate::config::ExecutorConfig;
use crate::intent::{
    AppParams, Command, FileParams, Intent, NoteParams, Outcome, PathParams, WebsiteParams,
};
use crate::system::{Launcher, SystemSnapshot, Telemetry};

/// Reply for actions outside the capability set
pub const UNSUPPORTED_MESSAGE: &str = "I'm not sure how to do that yet";

/// Web search URL prefix
pub const WEB_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Video search URL prefix
pub const VIDEO_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";

/// Music search URL prefix
pub const MUSIC_SEARCH_URL: &str = "https://music.youtube.com/search?q=";

/// What a handler did
#[derive(Debug)]
enum Effect {
    /// Completed; speak the intent's response
    Done,
    /// Completed with its own message
    Report(String),
    /// Anticipated failure with a user-facing sentence
    Failed(String),
}

/// Runs capability handlers against the local machine
pub struct Executor {
    workspace_dir: PathBuf,
    apps: AppTable,
    notes: NotesLog,
    launcher: Arc<dyn Launcher>,
    telemetry: Arc<dyn Telemetry>,
}

impl Executor {
    /// Create an executor
    #[must_use]
    pub fn new(
        config: &ExecutorConfig,
        launcher: Arc<dyn Launcher>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            workspace_dir: config.workspace_dir.clone(),
            apps: AppTable::new(&config.extra_apps),
            notes: NotesLog::new(&config.notes_path),
            launcher,
            telemetry,
        }
    }

    /// Known-application table in use
    #[must_use]
    pub const fn apps(&self) -> &AppTable {
        &self.apps
    }

    /// Notes log written by `TAKE_NOTE`
    #[must_use]
    pub const fn notes(&self) -> &NotesLog {
        &self.notes
    }

    /// Execute one intent
    ///
    /// Never fails; every error is folded into the returned [`Outcome`].
    #[must_use]
    pub fn execute(&self, intent: &Intent) -> Outcome {
        tracing::debug!(action = %intent.action, "executing");

        match self.dispatch(intent) {
            Ok(Effect::Done) => {
                let message = if intent.response.trim().is_empty() {
                    "Done.".to_string()
                } else {
                    intent.response.clone()
                };
                Outcome::success(message)
            }
            Ok(Effect::Report(message)) => Outcome::success(message),
            Ok(Effect::Failed(message)) => {
                tracing::info!(action = %intent.action, message = %message, "action failed");
                Outcome::failure(message)
            }
            Err(e) => {
                tracing::warn!(action = %intent.action, error = %e, "handler error");
                Outcome::failure(format!("Execution error: {e}"))
            }
        }
    }

    fn dispatch(&self, intent: &Intent) -> Result<Effect> {
        match Command::decode(intent.action, &intent.parameters)? {
            Command::OpenBrowser => {
                self.launcher.open_url("about:blank")?;
                Ok(Effect::Done)
            }
            Command::SearchWeb(p) => self.search(WEB_SEARCH_URL, &p.query),
            Command::OpenApp(p) => Ok(self.open_app(&p)),
            Command::OpenWebsite(p) => self.open_website(&p),
            Command::PlayYoutube(p) => self.search(VIDEO_SEARCH_URL, &p.query),
            Command::PlayMusic(p) => self.search(MUSIC_SEARCH_URL, &p.query),
            Command::SystemStats => {
                let snapshot = self.telemetry.snapshot()?;
                Ok(Effect::Report(format_stats(&snapshot)))
            }
            Command::CreateFolder(p) => Ok(self.create_folder(&p)),
            Command::CreateFile(p) => Ok(self.create_file(&p)),
            Command::OpenFile(p) => Ok(self.open_file(&p)),
            Command::TakeNote(p) => Ok(self.take_note(&p)),
            Command::Conversation => Ok(Effect::Done),
            Command::Unknown => Ok(Effect::Failed(UNSUPPORTED_MESSAGE.to_string())),
        }
    }

    fn search(&self, prefix: &str, query: &str) -> Result<Effect> {
        let url = format!("{prefix}{}", urlencoding::encode(query.trim()));
        self.launcher.open_url(&url)?;
        Ok(Effect::Done)
    }

    /// Try the mapped executable, then the raw name
    fn open_app(&self, params: &AppParams) -> Effect {
        let requested = params.app_name.trim().to_lowercase();
        if requested.is_empty() {
            return Effect::Failed("I didn't catch which application to open.".to_string());
        }

        if let Some(mapped) = self.apps.resolve(&requested) {
            match self.launcher.launch(mapped) {
                Ok(()) => return Effect::Done,
                Err(e) if mapped == requested => {
                    tracing::warn!(app = %requested, error = %e, "launch failed");
                    return Effect::Failed(format!("Could not find application: {requested}"));
                }
                Err(e) => {
                    tracing::debug!(app = %requested, exe = mapped, error = %e, "mapped launch failed, trying raw name");
                }
            }
        }

        match self.launcher.launch(&requested) {
            Ok(()) => Effect::Done,
            Err(e) => {
                tracing::warn!(app = %requested, error = %e, "launch failed");
                Effect::Failed(format!("Could not find application: {requested}"))
            }
        }
    }

    fn open_website(&self, params: &WebsiteParams) -> Result<Effect> {
        let raw = params.url.trim();
        let address = if has_scheme(raw) {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        self.launcher.open_url(&address)?;
        Ok(Effect::Done)
    }

    fn create_folder(&self, params: &PathParams) -> Effect {
        let Some(path) = self.resolve_path(&params.path) else {
            return Effect::Failed("I need a folder name to create.".to_string());
        };

        match std::fs::create_dir_all(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "folder created");
                Effect::Done
            }
            Err(e) => Effect::Failed(format!("Could not create folder {}: {e}", path.display())),
        }
    }

    fn create_file(&self, params: &FileParams) -> Effect {
        let Some(path) = self.resolve_path(&params.path) else {
            return Effect::Failed("I need a file name to create.".to_string());
        };

        let written = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&path, &params.content));

        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), bytes = params.content.len(), "file written");
                Effect::Done
            }
            Err(e) => Effect::Failed(format!("Could not create file {}: {e}", path.display())),
        }
    }

    fn open_file(&self, params: &PathParams) -> Effect {
        let Some(path) = self.resolve_path(&params.path) else {
            return Effect::Failed("I need a file name to open.".to_string());
        };

        match self.launcher.open_path(&path) {
            Ok(()) => Effect::Done,
            Err(e) => Effect::Failed(format!("Could not open {}: {e}", path.display())),
        }
    }

    fn take_note(&self, params: &NoteParams) -> Effect {
        match self.notes.append(params.note.trim()) {
            Ok(()) => Effect::Done,
            Err(e) => Effect::Failed(format!("Could not save the note: {e}")),
        }
    }

    /// Resolve a user path against the workspace; `None` if blank
    fn resolve_path(&self, raw: &str) -> Option<PathBuf> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let home = || directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf());
        let path = match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
            Some(rest) => home().map_or_else(|| self.workspace_dir.join(rest), |h| h.join(rest)),
            None if raw == "~" => home().unwrap_or_else(|| self.workspace_dir.clone()),
            None if Path::new(raw).is_absolute() => PathBuf::from(raw),
            None => self.workspace_dir.join(raw),
        };

        Some(path)
    }
}

fn has_scheme(address: &str) -> bool {
    address
        .split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)))
}

/// Spoken system stats sentence
#[must_use]
pub fn format_stats(s: &SystemSnapshot) -> String {
    format!(
        "System stats: CPU usage is {:.1}%, RAM usage is {:.1}%, {:.2} GB of storage used, \
         {:.2} GB free out of {:.2} GB",
        s.cpu, s.memory, s.disk_used, s.disk_free, s.disk_total
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::system::SysinfoTelemetry;
    use crate::system::SystemLauncher;

    fn executor(workspace: &Path) -> Executor {
        let config = ExecutorConfig {
            workspace_dir: workspace.to_path_buf(),
            notes_path: workspace.join("notes.txt"),
            extra_apps: BTreeMap::new(),
        };
        Executor::new(
            &config,
            Arc::new(SystemLauncher::new()),
            Arc::new(SysinfoTelemetry::new(workspace)),
        )
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com"));
        assert!(has_scheme("http://example.com"));
        assert!(has_scheme("ftp://files.example.com"));
        assert!(!has_scheme("example.com"));
        assert!(!has_scheme("example.com/?next=https://x"));
    }

    #[test]
    fn test_resolve_path() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(dir.path());

        assert_eq!(executor.resolve_path("  "), None);
        assert_eq!(executor.resolve_path("data/x.txt"), Some(dir.path().join("data/x.txt")));

        let absolute = dir.path().join("abs");
        assert_eq!(
            executor.resolve_path(absolute.to_str().unwrap()),
            Some(absolute.clone())
        );

        let home = executor.resolve_path("~/goku-notes").unwrap();
        assert!(home.ends_with("goku-notes"));
        assert!(home.is_absolute());
    }

    #[test]
    fn test_format_stats_template() {
        let snapshot = SystemSnapshot {
            cpu: 12.5,
            memory: 48.3,
            memory_used: 7.72,
            memory_total: 16.0,
            disk_used: 120.456,
            disk_free: 379.5,
            disk_total: 500.0,
        };

        assert_eq!(
            format_stats(&snapshot),
            "System stats: CPU usage is 12.5%, RAM usage is 48.3%, 120.46 GB of storage used, \
             379.50 GB free out of 500.00 GB"
        );
    }

    #[test]
    fn test_blank_parameters_are_anticipated_failures() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(dir.path());

        for action in [
            crate::intent::Action::CreateFolder,
            crate::intent::Action::CreateFile,
            crate::intent::Action::OpenFile,
            crate::intent::Action::OpenApp,
        ] {
            let outcome = executor.execute(&Intent::new(action, serde_json::Map::new(), "ok"));
            assert!(!outcome.success, "{action} should fail");
            assert!(!outcome.message.starts_with("Execution error"), "{action}");
            assert!(outcome.message.ends_with('.'), "{action}: {}", outcome.message);
        }
    }
}
