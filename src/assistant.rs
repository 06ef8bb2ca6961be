//! One activation cycle: capture, interpret, execute, speak
//!
//! Cycles never overlap. A second request while one is in flight is turned
//! away without being interpreted.

use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::io::AsyncBufRead;
use tracing::Instrument;
use uuid::Uuid;

use crate::Result;
use crate::config::Config;
use crate::executor::Executor;
use crate::intent::Outcome;
use crate::interpreter::Interpreter;
use crate::system::{SysinfoTelemetry, SystemLauncher};
use crate::voice::{ConsoleInput, ConsoleVoice, SpeechInput, SpeechOutput, SystemVoice};

/// Reply while another cycle is running
pub const BUSY_MESSAGE: &str = "I'm still working on your last request";

/// Prompt spoken when listening starts
pub const LISTENING_PROMPT: &str = "I'm listening";

/// Spoken when listening yields nothing
pub const NOTHING_HEARD: &str = "I didn't hear anything";

/// Spoken on shutdown
pub const FAREWELL: &str = "Goodbye! Powering down.";

/// Clears the in-flight flag when a cycle ends
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Double-press trigger: two presses within `window` activate
#[derive(Debug, Clone)]
pub struct DoublePress {
    window: Duration,
    last: Option<Instant>,
}

impl DoublePress {
    /// Trigger for presses at most `window` apart
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Record a press at `at`; true when it completes a double press
    pub fn press(&mut self, at: Instant) -> bool {
        match self.last.take() {
            Some(prev) if at.saturating_duration_since(prev) <= self.window => true,
            _ => {
                self.last = Some(at);
                false
            }
        }
    }

    /// Forget a pending first press
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// The voice assistant
pub struct Assistant {
    name: String,
    wake_word: String,
    listen_timeout: Duration,
    phrase_limit: Duration,
    double_press_window: Duration,
    interpreter: Interpreter,
    executor: Arc<Executor>,
    voice: Arc<dyn SpeechOutput>,
    busy: AtomicBool,
}

impl Assistant {
    /// Assemble an assistant from its parts
    #[must_use]
    pub fn new(
        config: &Config,
        interpreter: Interpreter,
        executor: Executor,
        voice: Arc<dyn SpeechOutput>,
    ) -> Self {
        Self {
            name: config.assistant.name.clone(),
            wake_word: config.assistant.wake_word.clone(),
            listen_timeout: config.assistant.listen_timeout,
            phrase_limit: config.assistant.phrase_limit,
            double_press_window: config.assistant.double_press_window,
            interpreter,
            executor: Arc::new(executor),
            voice,
            busy: AtomicBool::new(false),
        }
    }

    /// Build the assistant against the real backend, desktop and TTS
    ///
    /// # Errors
    ///
    /// Returns error if the reasoning backend cannot be configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let interpreter = Interpreter::from_config(config)?;
        let executor = Executor::new(
            &config.executor,
            Arc::new(SystemLauncher::new()),
            Arc::new(SysinfoTelemetry::new(&config.executor.workspace_dir)),
        );

        let voice: Arc<dyn SpeechOutput> = if config.voice.enabled {
            Arc::new(SystemVoice::detect(&config.assistant.name, &config.voice))
        } else {
            Arc::new(ConsoleVoice::new(&config.assistant.name))
        };

        Ok(Self::new(config, interpreter, executor, voice))
    }

    /// Assistant name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a cycle is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one cycle for a command that is already text
    pub async fn handle(&self, command: &str) -> Outcome {
        let Some(_guard) = CycleGuard::acquire(&self.busy) else {
            tracing::info!(command, "cycle in flight, request refused");
            return Outcome::failure(BUSY_MESSAGE);
        };

        self.run_cycle(command).await
    }

    /// Prompt the user, listen for one command and run it
    ///
    /// Returns `None` if nothing was heard.
    pub async fn activate(&self, input: &dyn SpeechInput) -> Option<Outcome> {
        let Some(_guard) = CycleGuard::acquire(&self.busy) else {
            tracing::info!("cycle in flight, activation ignored");
            return Some(Outcome::failure(BUSY_MESSAGE));
        };

        self.voice.speak(LISTENING_PROMPT).await;

        let Some(command) = input.listen(self.listen_timeout, self.phrase_limit).await else {
            self.voice.speak(NOTHING_HEARD).await;
            return None;
        };

        tracing::info!(command = %command, "command heard");
        self.voice.speak("Processing").await;
        Some(self.run_cycle(&command).await)
    }

    /// Free-form chat reply, spoken and returned
    pub async fn chat(&self, message: &str) -> String {
        let reply = self.interpreter.chat(message).await;
        self.voice.speak(&reply).await;
        reply
    }

    /// Speak the startup greeting
    pub async fn greet(&self, how_to_activate: &str) {
        self.voice
            .speak(&format!("{} assistant initialized. {how_to_activate}", self.name))
            .await;
    }

    /// Speak the shutdown message
    pub async fn farewell(&self) {
        self.voice.speak(FAREWELL).await;
    }

    async fn run_cycle(&self, command: &str) -> Outcome {
        let span = tracing::info_span!("cycle", id = %Uuid::new_v4());

        async {
            tracing::info!(command, "processing command");

            let intent = self.interpreter.process(command).await;
            let executor = Arc::clone(&self.executor);
            let outcome = tokio::task::spawn_blocking(move || executor.execute(&intent))
                .await
                .unwrap_or_else(|e| Outcome::failure(format!("Execution error: {e}")));

            if outcome.success {
                self.voice.speak(&outcome.message).await;
            } else {
                self.voice
                    .speak(&format!("Sorry, I encountered an issue: {}", outcome.message))
                    .await;
            }

            tracing::info!(success = outcome.success, "cycle complete");
            outcome
        }
        .instrument(span)
        .await
    }

    /// Typed-command loop until `exit`, end of input or Ctrl+C
    ///
    /// Pressing Enter twice on empty lines within the double-press window
    /// starts a listening prompt, like the hotkey does.
    pub async fn run_text<R>(&self, input: &ConsoleInput<R>)
    where
        R: AsyncBufRead + Unpin + Send,
    {
        self.greet("Type a command, or exit to quit.").await;
        let mut trigger = DoublePress::new(self.double_press_window);

        loop {
            print!("You: ");
            let _ = std::io::stdout().flush();

            let line = tokio::select! {
                line = input.read_line() => line,
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    None
                }
            };

            let Some(line) = line else {
                break;
            };

            match line.to_lowercase().as_str() {
                "" => {
                    if trigger.press(Instant::now()) {
                        self.activate(input).await;
                    }
                }
                "exit" | "quit" => break,
                _ => {
                    trigger.reset();
                    self.handle(&line).await;
                }
            }
        }

        self.farewell().await;
    }

    /// Wake-word loop on the microphone until Ctrl+C
    ///
    /// Saying the wake word with a command runs it directly; the wake word
    /// alone starts a listening prompt.
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened
    #[cfg(feature = "microphone")]
    pub async fn run_voice(&self, mic: &crate::voice::MicrophoneInput) -> Result<()> {
        use crate::voice::WakeWordDetector;

        let stop = Arc::new(AtomicBool::new(false));
        let stopper = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stopper.store(true, Ordering::Relaxed);
            }
        });

        self.greet(&format!("Say {} to activate me.", self.wake_word)).await;
        tracing::info!(wake_word = %self.wake_word, "listening for wake word");

        let mut detector = WakeWordDetector::new(&self.wake_word);
        while !stop.load(Ordering::Relaxed) {
            let (returned, segment) = mic
                .next_segment(detector, None, self.phrase_limit, Arc::clone(&stop))
                .await;
            detector = returned;

            let Some(segment) = segment? else {
                continue;
            };
            let Some(transcript) = mic.transcribe(&segment).await else {
                continue;
            };

            match detector.match_transcript(&transcript) {
                Some(command) if command.is_empty() => {
                    self.activate(mic).await;
                }
                Some(command) => {
                    self.handle(&command).await;
                }
                None => tracing::debug!(transcript = %transcript, "no wake word"),
            }
        }

        self.farewell().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_press_within_window() {
        let mut trigger = DoublePress::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(!trigger.press(start));
        assert!(trigger.press(start + Duration::from_millis(300)));

        // A completed double press starts over
        assert!(!trigger.press(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_slow_presses_do_not_trigger() {
        let mut trigger = DoublePress::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(!trigger.press(start));
        assert!(!trigger.press(start + Duration::from_millis(600)));
        // The late press becomes the new first press
        assert!(trigger.press(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_reset_drops_pending_press() {
        let mut trigger = DoublePress::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(!trigger.press(start));
        trigger.reset();
        assert!(!trigger.press(start + Duration::from_millis(100)));
    }
}
