//! External process execution.
//!
//! [`ProcessRunner`] spawns a command with stdin closed, forwards every line
//! written to stdout or stderr as soon as it is available, and maps the exit
//! status onto [`ProcessError`]. A JSON variant captures stdout in full and
//! parses it as a single document.
//!
//! Retry policy belongs to callers; the runner never retries.

mod error;
mod runner;
mod types;

pub use error::ProcessError;
pub use runner::ProcessRunner;
pub use types::{OutputStream, ProcessLine};
