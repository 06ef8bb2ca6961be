//! Append-only notes log

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::Result;

/// Timestamped note records, one per line
///
/// Each record is written with a single `write_all` on a file opened in
/// append mode, so concurrent writers never interleave within a record.
#[derive(Debug, Clone)]
pub struct NotesLog {
    path: PathBuf,
}

impl NotesLog {
    /// Open (lazily) the log at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one note stamped with the local time
    ///
    /// # Errors
    ///
    /// Returns error if the log directory or file cannot be written
    pub fn append(&self, note: &str) -> Result<()> {
        self.append_at(Local::now(), note)
    }

    /// Append one note with an explicit timestamp
    ///
    /// # Errors
    ///
    /// Returns error if the log directory or file cannot be written
    pub fn append_at(&self, at: DateTime<Local>, note: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let record = format_record(at, note);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.as_bytes())?;

        tracing::debug!(path = %self.path.display(), "note saved");
        Ok(())
    }

    /// The last `n` records, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the log exists but cannot be read
    pub fn recent(&self, n: usize) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }
}

/// `[YYYY-MM-DD HH:MM:SS] note\n`, with line breaks in the note flattened
fn format_record(at: DateTime<Local>, note: &str) -> String {
    let flat = note.lines().map(str::trim).collect::<Vec<_>>().join(" ");
    format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), flat.trim())
}
