//! Turns free-form commands into structured intents
//!
//! The interpreter never performs side effects and never returns an error:
//! every failure resolves to a fallback [`Intent`] the caller can speak.

use std::sync::Arc;

use crate::Result;
use crate::config::Config;
use crate::intent::Intent;
use crate::prompt;
use crate::reasoning::{HttpBackend, ReasoningBackend};

/// Command interpreter backed by a reasoning model
pub struct Interpreter {
    backend: Arc<dyn ReasoningBackend>,
    assistant_name: String,
    preamble: String,
}

impl Interpreter {
    /// Create an interpreter over an existing backend
    #[must_use]
    pub fn new(config: &Config, backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            backend,
            assistant_name: config.assistant.name.clone(),
            preamble: prompt::instruction_preamble(&config.assistant.name),
        }
    }

    /// Create an interpreter talking to the configured hosted provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing or the HTTP client
    /// cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.reasoning)?;
        Ok(Self::new(config, Arc::new(backend)))
    }

    /// Interpret one command
    ///
    /// Unparseable replies become [`Intent::misunderstood`]; backend failures
    /// become [`Intent::failed`].
    pub async fn process(&self, command: &str) -> Intent {
        let prompt = prompt::command_prompt(&self.preamble, command);

        let reply = match self.backend.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "reasoning backend failed");
                return Intent::failed();
            }
        };

        let body = prompt::strip_code_fences(&reply);
        match Intent::from_model_json(body) {
            Ok(intent) => {
                tracing::info!(
                    action = %intent.action,
                    intent = %intent.intent,
                    "command interpreted"
                );
                intent
            }
            Err(e) => {
                tracing::warn!(error = %e, reply = %reply, "reply is not a JSON object");
                Intent::misunderstood()
            }
        }
    }

    /// Free-form reply with no action semantics
    ///
    /// Returns `"Error: …"` instead of failing.
    pub async fn chat(&self, message: &str) -> String {
        let prompt = prompt::chat_prompt(&self.assistant_name, message);

        match self.backend.generate(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                format!("Error: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::Error;
    use crate::config::file::GokuConfigFile;
    use crate::intent::{Action, FAILED_RESPONSE, MISUNDERSTOOD_RESPONSE};

    struct Scripted {
        reply: std::result::Result<String, fn() -> Error>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(make: fn() -> Error) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(make),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReasoningBackend for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn config() -> Config {
        Config::from_sources(GokuConfigFile::default(), |_| None)
    }

    #[tokio::test]
    async fn test_well_formed_reply() {
        let backend = Scripted::replying(
            r#"{"intent":"open notepad","action":"OPEN_APP","parameters":{"app_name":"notepad"},"response":"Opening Notepad"}"#,
        );
        let interpreter = Interpreter::new(&config(), backend.clone());

        let intent = interpreter.process("open notepad").await;
        assert_eq!(intent.action, Action::OpenApp);
        assert_eq!(intent.response, "Opening Notepad");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User command: open notepad"));
        assert!(prompts[0].contains("OPEN_APP"));
    }

    #[tokio::test]
    async fn test_fenced_reply_matches_bare_reply() {
        let bare = r#"{"intent":"stats","action":"SYSTEM_STATS","parameters":{},"response":"Checking"}"#;
        let fenced = format!("```json\n{bare}\n```");

        let a = Interpreter::new(&config(), Scripted::replying(bare))
            .process("stats")
            .await;
        let b = Interpreter::new(&config(), Scripted::replying(&fenced))
            .process("stats")
            .await;

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_garbage_reply_is_misunderstood() {
        let interpreter = Interpreter::new(&config(), Scripted::replying("Sure! I'll do that."));

        let intent = interpreter.process("do the thing").await;
        assert_eq!(intent.action, Action::Unknown);
        assert!(intent.parameters.is_empty());
        assert_eq!(intent.response, MISUNDERSTOOD_RESPONSE);
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported_distinctly() {
        let interpreter = Interpreter::new(
            &config(),
            Scripted::failing(|| Error::Timeout(Duration::from_secs(30))),
        );

        let intent = interpreter.process("open chrome").await;
        assert_eq!(intent.action, Action::Unknown);
        assert_eq!(intent.response, FAILED_RESPONSE);
    }

    #[tokio::test]
    async fn test_chat_uses_persona_prompt() {
        let backend = Scripted::replying("  I'm doing great!\n");
        let interpreter = Interpreter::new(&config(), backend.clone());

        assert_eq!(interpreter.chat("how are you?").await, "I'm doing great!");

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("You are Goku"));
        assert!(!prompts[0].contains("PRIMARY_ACTION_TYPES"));
    }

    #[tokio::test]
    async fn test_chat_failure_becomes_error_text() {
        let interpreter = Interpreter::new(
            &config(),
            Scripted::failing(|| Error::Reasoning("quota exceeded".to_string())),
        );

        let reply = interpreter.chat("hello").await;
        assert!(reply.starts_with("Error: "));
        assert!(reply.contains("quota exceeded"));
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(Interpreter::from_config(&config()).is_err());
    }
}
