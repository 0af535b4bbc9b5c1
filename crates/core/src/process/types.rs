//! Line types emitted by the process runner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A single complete line of child output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLine {
    pub stream: OutputStream,
    pub text: String,
}

impl ProcessLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }

    /// Render the line for a sink that interleaves both streams.
    ///
    /// `tagged("yt-dlp")` yields `[yt-dlp] ...` for stdout and
    /// `[yt-dlp:stderr] ...` for stderr.
    pub fn tagged(&self, label: &str) -> String {
        match self.stream {
            OutputStream::Stdout => format!("[{}] {}", label, self.text),
            OutputStream::Stderr => format!("[{}:stderr] {}", label, self.text),
        }
    }
}

impl fmt::Display for ProcessLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stream {
            OutputStream::Stdout => write!(f, "[stdout] {}", self.text),
            OutputStream::Stderr => write!(f, "[stderr] {}", self.text),
        }
    }
}
