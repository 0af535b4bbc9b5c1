//! Error types for external process execution.

use thiserror::Error;

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be launched (not found, permission denied, ...).
    #[error("{program} failed to start: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("{program} exited with {}{}", describe_code(.code), describe_detail(.detail))]
    Exit {
        program: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        /// Captured stderr, only available in JSON mode.
        detail: Option<String>,
    },

    /// Captured stdout was not a valid JSON document.
    #[error("Unable to parse {program} output: {reason}")]
    Parse { program: String, reason: String },

    /// The process exceeded the configured timeout and was killed.
    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },

    /// I/O error while talking to the child.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn describe_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(": {}", detail),
        _ => String::new(),
    }
}

impl ProcessError {
    /// Exit code of a process that ran to completion, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code, .. } => *code,
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Exit { .. } => "exit",
            Self::Parse { .. } => "parse",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_display() {
        let err = ProcessError::Exit {
            program: "yt-dlp".to_string(),
            code: Some(1),
            detail: None,
        };
        assert_eq!(err.to_string(), "yt-dlp exited with code 1");
        assert_eq!(err.exit_code(), Some(1));

        let err = ProcessError::Exit {
            program: "yt-dlp".to_string(),
            code: Some(2),
            detail: Some("ERROR: Video unavailable".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "yt-dlp exited with code 2: ERROR: Video unavailable"
        );
    }

    #[test]
    fn test_signal_exit_display() {
        let err = ProcessError::Exit {
            program: "yt-dlp".to_string(),
            code: None,
            detail: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
        assert_eq!(err.kind(), "exit");
    }
}
