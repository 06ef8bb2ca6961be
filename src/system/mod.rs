//! Local operating-system collaborators: launching things and reading
//! telemetry
//!
//! The executor only talks to these traits, so capability handlers can be
//! exercised with recording stubs instead of a real desktop.

mod launcher;
mod telemetry;

pub use launcher::{Launcher, SystemLauncher};
pub use telemetry::{SysinfoTelemetry, SystemSnapshot, Telemetry};
