//! Per-action parameter decoding
//!
//! The backend hands back a free-form parameter bag. Each capability gets a
//! struct with named fields that default to the empty string, and the bag is
//! decoded into it once at the dispatch boundary.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::Action;
use crate::{Error, Result};

/// `SEARCH_WEB`, `PLAY_YOUTUBE`, `PLAY_MUSIC`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Search terms
    #[serde(deserialize_with = "lenient_string")]
    pub query: String,
}

/// `OPEN_APP`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppParams {
    /// Application name as spoken
    #[serde(deserialize_with = "lenient_string")]
    pub app_name: String,
}

/// `OPEN_WEBSITE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebsiteParams {
    /// Address, with or without a scheme
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

/// `CREATE_FOLDER`, `OPEN_FILE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathParams {
    /// Target path
    #[serde(deserialize_with = "lenient_string")]
    pub path: String,
}

/// `CREATE_FILE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileParams {
    /// Target path
    #[serde(deserialize_with = "lenient_string")]
    pub path: String,

    /// File body, empty when omitted
    #[serde(deserialize_with = "lenient_string")]
    pub content: String,
}

/// `TAKE_NOTE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NoteParams {
    /// Note text
    #[serde(deserialize_with = "lenient_string")]
    pub note: String,
}

/// A decoded action, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenBrowser,
    SearchWeb(QueryParams),
    OpenApp(AppParams),
    OpenWebsite(WebsiteParams),
    PlayYoutube(QueryParams),
    PlayMusic(QueryParams),
    SystemStats,
    CreateFolder(PathParams),
    CreateFile(FileParams),
    OpenFile(PathParams),
    TakeNote(NoteParams),
    Conversation,
    Unknown,
}

impl Command {
    /// Decode the parameter bag for `action`
    ///
    /// # Errors
    ///
    /// Returns error if a parameter holds a list or object where text is expected
    pub fn decode(action: Action, parameters: &Map<String, Value>) -> Result<Self> {
        Ok(match action {
            Action::OpenBrowser => Self::OpenBrowser,
            Action::SearchWeb => Self::SearchWeb(decode(parameters)?),
            Action::OpenApp => Self::OpenApp(decode(parameters)?),
            Action::OpenWebsite => Self::OpenWebsite(decode(parameters)?),
            Action::PlayYoutube => Self::PlayYoutube(decode(parameters)?),
            Action::PlayMusic => Self::PlayMusic(decode(parameters)?),
            Action::SystemStats => Self::SystemStats,
            Action::CreateFolder => Self::CreateFolder(decode(parameters)?),
            Action::CreateFile => Self::CreateFile(decode(parameters)?),
            Action::OpenFile => Self::OpenFile(decode(parameters)?),
            Action::TakeNote => Self::TakeNote(decode(parameters)?),
            Action::Conversation => Self::Conversation,
            Action::Unknown => Self::Unknown,
        })
    }
}

fn decode<T: DeserializeOwned>(parameters: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(parameters.clone()))
        .map_err(|e| Error::Parameters(e.to_string()))
}

/// Accept any scalar as text; `null` becomes the empty string
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected text, found {other}"))),
    }
}
