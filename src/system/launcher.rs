//! Process, browser and file launching

use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// Opens URLs and files and starts programs without waiting for them
pub trait Launcher: Send + Sync {
    /// Open a URL in the default browser
    ///
    /// # Errors
    ///
    /// Returns error if the platform opener cannot be started
    fn open_url(&self, url: &str) -> Result<()>;

    /// Open a file with its registered default application
    ///
    /// # Errors
    ///
    /// Returns error if the path does not exist or the opener cannot be started
    fn open_path(&self, path: &Path) -> Result<()>;

    /// Start a program by executable name
    ///
    /// # Errors
    ///
    /// Returns error if the program cannot be found or started
    fn launch(&self, program: &str) -> Result<()>;
}

/// Launcher backed by the host platform's opener commands
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    /// Create a new system launcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Launcher for SystemLauncher {
    fn open_url(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "opening url");
        spawn_detached(opener_command(url))
    }

    fn open_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::Launch(format!("{} does not exist", path.display())));
        }

        tracing::debug!(path = %path.display(), "opening file");
        spawn_detached(opener_command(path.as_os_str()))
    }

    fn launch(&self, program: &str) -> Result<()> {
        if program.trim().is_empty() {
            return Err(Error::Launch("no program given".to_string()));
        }

        match which::which(program) {
            Ok(resolved) => {
                tracing::debug!(program, path = %resolved.display(), "launching program");
                spawn_detached(Command::new(resolved))
            }
            Err(e) => launch_unresolved(program, &e),
        }
    }
}

/// macOS apps live in bundles rather than on `PATH`
#[cfg(target_os = "macos")]
fn launch_unresolved(program: &str, _: &which::Error) -> Result<()> {
    tracing::debug!(program, "launching application bundle");
    let status = Command::new("open")
        .arg("-a")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::Launch(format!("failed to run open: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Launch(format!("no application named {program}")))
    }
}

#[cfg(not(target_os = "macos"))]
fn launch_unresolved(program: &str, e: &which::Error) -> Result<()> {
    Err(Error::Launch(format!("{program}: {e}")))
}

#[cfg(target_os = "windows")]
fn opener_command(target: impl AsRef<std::ffi::OsStr>) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(target);
    cmd
}

#[cfg(target_os = "macos")]
fn opener_command(target: impl AsRef<std::ffi::OsStr>) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(target);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(target: impl AsRef<std::ffi::OsStr>) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}

fn spawn_detached(mut cmd: Command) -> Result<()> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|e| Error::Launch(format!("{}: {e}", cmd.get_program().to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_path_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");

        let err = SystemLauncher::new().open_path(&missing).unwrap_err();
        assert!(matches!(err, Error::Launch(msg) if msg.contains("does not exist")));
    }

    #[test]
    fn test_launch_empty_program_fails() {
        assert!(SystemLauncher::new().launch("   ").is_err());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_launch_unknown_program_fails() {
        let err = SystemLauncher::new()
            .launch("definitely-not-a-real-program-4711")
            .unwrap_err();
        assert!(matches!(err, Error::Launch(_)));
    }
}
