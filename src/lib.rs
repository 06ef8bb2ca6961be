//! Goku - desktop voice assistant
//!
//! This library provides the command pipeline behind the `goku` binary:
//! - Interpretation of free-form commands into structured intents
//! - Execution of intents against the local machine
//! - Voice input and output around each activation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Assistant                        │
//! │   listen  │  interpret  │  execute  │  speak        │
//! └──────┬──────────────┬──────────────┬────────────────┘
//!        │              │              │
//! ┌──────▼─────┐ ┌──────▼──────┐ ┌─────▼──────────────┐
//! │   Voice    │ │ Interpreter │ │     Executor       │
//! │ wake word  │ │  prompt +   │ │ apps │ files │ web │
//! │ STT / TTS  │ │  reasoning  │ │ notes │ telemetry  │
//! └────────────┘ └─────────────┘ └────────────────────┘
//! ```
//!
//! The interpreter never touches the machine and the executor never talks to
//! the reasoning backend; [`Intent`] is the only thing that crosses between
//! them.

pub mod assistant;
pub mod config;
pub mod error;
pub mod executor;
pub mod intent;
pub mod interpreter;
pub mod prompt;
pub mod reasoning;
pub mod setup;
pub mod system;
pub mod voice;

pub use assistant::Assistant;
pub use config::Config;
pub use error::{Error, Result};
pub use executor::Executor;
pub use intent::{Action, Intent, Outcome};
pub use interpreter::Interpreter;
