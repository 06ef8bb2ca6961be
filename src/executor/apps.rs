//! Known-application table: spoken short names to platform executables

use std::collections::BTreeMap;

#[cfg(target_os = "windows")]
const PLATFORM_APPS: &[(&str, &str)] = &[
    ("notepad", "notepad.exe"),
    ("calculator", "calc.exe"),
    ("paint", "mspaint.exe"),
    ("explorer", "explorer.exe"),
    ("chrome", "chrome.exe"),
    ("edge", "msedge.exe"),
    ("firefox", "firefox.exe"),
    ("cmd", "cmd.exe"),
    ("terminal", "wt.exe"),
    ("powershell", "powershell.exe"),
    ("vscode", "code.exe"),
    ("spotify", "spotify.exe"),
];

#[cfg(target_os = "macos")]
const PLATFORM_APPS: &[(&str, &str)] = &[
    ("notepad", "TextEdit"),
    ("calculator", "Calculator"),
    ("paint", "Preview"),
    ("explorer", "Finder"),
    ("chrome", "Google Chrome"),
    ("edge", "Microsoft Edge"),
    ("firefox", "Firefox"),
    ("cmd", "Terminal"),
    ("terminal", "Terminal"),
    ("powershell", "pwsh"),
    ("vscode", "Visual Studio Code"),
    ("spotify", "Spotify"),
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLATFORM_APPS: &[(&str, &str)] = &[
    ("notepad", "gedit"),
    ("calculator", "gnome-calculator"),
    ("paint", "kolourpaint"),
    ("explorer", "nautilus"),
    ("chrome", "google-chrome"),
    ("edge", "microsoft-edge"),
    ("firefox", "firefox"),
    ("cmd", "x-terminal-emulator"),
    ("terminal", "x-terminal-emulator"),
    ("powershell", "pwsh"),
    ("vscode", "code"),
    ("spotify", "spotify"),
];

/// Lookup table fixed at startup
#[derive(Debug, Clone)]
pub struct AppTable {
    entries: BTreeMap<String, String>,
}

impl AppTable {
    /// Platform defaults overlaid with configured entries
    #[must_use]
    pub fn new(extra: &BTreeMap<String, String>) -> Self {
        let mut entries: BTreeMap<String, String> = PLATFORM_APPS
            .iter()
            .map(|(name, exe)| ((*name).to_string(), (*exe).to_string()))
            .collect();

        for (name, exe) in extra {
            entries.insert(name.trim().to_lowercase(), exe.clone());
        }

        Self { entries }
    }

    /// Executable for a lower-case short name
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Iterate known names and their executables
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for AppTable {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}
