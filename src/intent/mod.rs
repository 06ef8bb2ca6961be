//! Structured commands exchanged between the interpreter and the executor
//!
//! An [`Intent`] is what the reasoning backend thinks the user asked for; an
//! [`Outcome`] is what happened when the executor acted on it. Both live for a
//! single activation and carry no identity.

mod params;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub use params::{AppParams, Command, FileParams, NoteParams, PathParams, QueryParams, WebsiteParams};

/// Spoken when the backend reply is not a usable JSON object
pub const MISUNDERSTOOD_RESPONSE: &str = "I didn't quite understand that. Could you rephrase?";

/// Spoken when the backend could not be reached or failed
pub const FAILED_RESPONSE: &str = "I encountered an error processing your request.";

/// Capability tag selecting exactly one executor handler
///
/// Unrecognised tags never survive decoding: they collapse to [`Action::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Open the default browser on a blank page
    OpenBrowser,
    /// Run a web search
    SearchWeb,
    /// Launch a desktop application
    OpenApp,
    /// Open a specific address
    OpenWebsite,
    /// Search for a video
    PlayYoutube,
    /// Search for music
    PlayMusic,
    /// Report CPU, memory and storage usage
    SystemStats,
    /// Create a directory
    CreateFolder,
    /// Create or overwrite a file
    CreateFile,
    /// Open a file with its registered handler
    OpenFile,
    /// Append to the notes log
    TakeNote,
    /// Plain conversation, nothing to do locally
    Conversation,
    /// Anything the assistant cannot act on
    #[default]
    Unknown,
}

impl Action {
    /// Every tag, in catalogue order
    pub const ALL: [Self; 13] = [
        Self::OpenBrowser,
        Self::SearchWeb,
        Self::OpenApp,
        Self::OpenWebsite,
        Self::PlayYoutube,
        Self::PlayMusic,
        Self::SystemStats,
        Self::CreateFolder,
        Self::CreateFile,
        Self::OpenFile,
        Self::TakeNote,
        Self::Conversation,
        Self::Unknown,
    ];

    /// Wire name of the tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenBrowser => "OPEN_BROWSER",
            Self::SearchWeb => "SEARCH_WEB",
            Self::OpenApp => "OPEN_APP",
            Self::OpenWebsite => "OPEN_WEBSITE",
            Self::PlayYoutube => "PLAY_YOUTUBE",
            Self::PlayMusic => "PLAY_MUSIC",
            Self::SystemStats => "SYSTEM_STATS",
            Self::CreateFolder => "CREATE_FOLDER",
            Self::CreateFile => "CREATE_FILE",
            Self::OpenFile => "OPEN_FILE",
            Self::TakeNote => "TAKE_NOTE",
            Self::Conversation => "CONVERSATION",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// One-line description used in the capability catalogue
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::OpenBrowser => "Open default browser",
            Self::SearchWeb => "Search Google",
            Self::OpenApp => "Launch an application",
            Self::OpenWebsite => "Open specific URL",
            Self::PlayYoutube => "Play video on YouTube",
            Self::PlayMusic => "Play music on YouTube Music",
            Self::SystemStats => "Show CPU/RAM/Storage stats",
            Self::CreateFolder => "Create a directory",
            Self::CreateFile => "Create a file",
            Self::OpenFile => "Open a file in default app",
            Self::TakeNote => "Save a note",
            Self::Conversation => "Just chatting/asking questions",
            Self::Unknown => "Cannot determine action",
        }
    }

    /// Example parameter object, if the tag takes parameters
    #[must_use]
    pub const fn parameter_hint(self) -> Option<&'static str> {
        match self {
            Self::SearchWeb => Some(r#"{"query": "search term"}"#),
            Self::OpenApp => Some(r#"{"app_name": "chrome"/"notepad"/"calculator"}"#),
            Self::OpenWebsite => Some(r#"{"url": "https://example.com"}"#),
            Self::PlayYoutube => Some(r#"{"query": "video search term"}"#),
            Self::PlayMusic => Some(r#"{"query": "song name"}"#),
            Self::CreateFolder => Some(r#"{"path": "folder_name"}"#),
            Self::CreateFile => Some(r#"{"path": "file_name.txt", "content": "optional content"}"#),
            Self::OpenFile => Some(r#"{"path": "file_name.txt"}"#),
            Self::TakeNote => Some(r#"{"note": "note text"}"#),
            Self::OpenBrowser | Self::SystemStats | Self::Conversation | Self::Unknown => None,
        }
    }

    /// Resolve a wire tag; only the exact upper-case names match
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == tag)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(Self::from_tag)
            .unwrap_or(Self::Unknown))
    }
}

/// Interpretation of one natural-language command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawIntent")]
pub struct Intent {
    /// Human-readable summary of the request (diagnostic only)
    pub intent: String,

    /// Capability to run
    pub action: Action,

    /// Action-specific arguments, validated by the executor
    pub parameters: Map<String, Value>,

    /// Sentence to speak when the action succeeds
    pub response: String,
}

impl Intent {
    /// Build an intent by hand
    #[must_use]
    pub fn new(action: Action, parameters: Map<String, Value>, response: impl Into<String>) -> Self {
        Self {
            intent: action.description().to_string(),
            action,
            parameters,
            response: response.into(),
        }
    }

    /// Fallback for replies that are not a usable JSON object
    #[must_use]
    pub fn misunderstood() -> Self {
        Self {
            intent: "unknown".to_string(),
            action: Action::Unknown,
            parameters: Map::new(),
            response: MISUNDERSTOOD_RESPONSE.to_string(),
        }
    }

    /// Fallback for backend failures
    #[must_use]
    pub fn failed() -> Self {
        Self {
            intent: "error".to_string(),
            action: Action::Unknown,
            parameters: Map::new(),
            response: FAILED_RESPONSE.to_string(),
        }
    }

    /// Strictly parse a JSON object produced by the reasoning backend
    ///
    /// # Errors
    ///
    /// Returns error if the text is not JSON or the top-level value is not an object
    pub fn from_model_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "expected a JSON object",
            ));
        }
        serde_json::from_value(value)
    }
}

/// Loosely-typed mirror of [`Intent`] used for decoding untrusted replies
#[derive(Deserialize)]
struct RawIntent {
    #[serde(default)]
    intent: Option<Value>,
    #[serde(default)]
    action: Option<Value>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    response: Option<Value>,
}

impl From<RawIntent> for Intent {
    fn from(raw: RawIntent) -> Self {
        let tag = raw.action.as_ref().and_then(Value::as_str);
        let mut action = tag.and_then(Action::from_tag).unwrap_or(Action::Unknown);
        if action == Action::Unknown && tag.is_some_and(|t| t != "UNKNOWN") {
            tracing::warn!(tag = ?tag, "unrecognised action tag");
        }

        let mut parameters = match raw.parameters {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                tracing::warn!(parameters = %other, "parameters are not an object");
                action = Action::Unknown;
                Map::new()
            }
        };
        if action == Action::Unknown {
            parameters.clear();
        }

        Self {
            intent: text_or_empty(raw.intent),
            action,
            parameters,
            response: text_or_empty(raw.response),
        }
    }
}

fn text_or_empty(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Result of executing an [`Intent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the action completed
    pub success: bool,

    /// User-facing sentence to speak or print
    pub message: String,
}

impl Outcome {
    /// Successful outcome
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
