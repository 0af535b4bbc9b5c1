//! Tokio-based external process runner.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::error::ProcessError;
use super::types::ProcessLine;
use crate::metrics::PROCESS_RUNS;

/// Runs external commands, optionally bounded by a timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner without a timeout; a hung child holds its caller indefinitely.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill the child and fail with [`ProcessError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Runs `program` with `args`, forwarding each output line to `on_line`.
    ///
    /// Lines from stdout and stderr are delivered in arrival order as soon as
    /// they are complete. Carriage returns (progress bars) also end a line.
    /// Succeeds only on exit code 0.
    pub async fn run<F>(
        &self,
        program: &Path,
        args: &[String],
        mut on_line: F,
    ) -> Result<(), ProcessError>
    where
        F: FnMut(ProcessLine) + Send,
    {
        let name = program_name(program);
        debug!("Running {} {:?}", name, args);

        let mut child = spawn(program, args, &name)?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let work = async {
            pump_lines(
                BufReader::new(stdout).split(b'\n'),
                BufReader::new(stderr).split(b'\n'),
                &mut on_line,
            )
            .await;
            child.wait().await
        };

        let outcome = self.bounded(work).await;
        let status = match outcome {
            Some(result) => result?,
            None => return Err(self.timed_out(&name, &mut child).await),
        };
        finish(&name, status, None)
    }

    /// Runs `program` capturing stdout in full and parsing it as one JSON document.
    ///
    /// A non-zero exit fails with the trimmed stderr as detail. Parsing is only
    /// attempted on success; empty output parses as an empty object.
    pub async fn run_json(
        &self,
        program: &Path,
        args: &[String],
    ) -> Result<serde_json::Value, ProcessError> {
        let name = program_name(program);
        debug!("Running {} {:?} (json)", name, args);

        let mut child = spawn(program, args, &name)?;
        let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let work = async {
            use tokio::io::AsyncReadExt;

            let mut out = Vec::new();
            let mut err = Vec::new();
            let (out_res, err_res) =
                tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
            out_res?;
            err_res?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        };

        let outcome = self.bounded(work).await;
        let (status, out, err) = match outcome {
            Some(result) => result?,
            None => return Err(self.timed_out(&name, &mut child).await),
        };

        let stderr_text = String::from_utf8_lossy(&err).trim().to_string();
        finish(&name, status, Some(stderr_text))?;

        let text = String::from_utf8_lossy(&out);
        let text = if text.trim().is_empty() { "{}" } else { text.trim() };
        serde_json::from_str(text).map_err(|e| {
            PROCESS_RUNS.with_label_values(&["parse"]).inc();
            ProcessError::Parse {
                program: name.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Applies the optional timeout. `None` means the limit fired.
    async fn bounded<T, Fut>(&self, work: Fut) -> Option<std::io::Result<T>>
    where
        Fut: std::future::Future<Output = std::io::Result<T>>,
    {
        match self.timeout {
            Some(limit) => timeout(limit, work).await.ok(),
            None => Some(work.await),
        }
    }

    async fn timed_out(&self, name: &str, child: &mut Child) -> ProcessError {
        if let Err(e) = child.kill().await {
            warn!("Failed to kill timed out {}: {}", name, e);
        }
        PROCESS_RUNS.with_label_values(&["timeout"]).inc();
        ProcessError::Timeout {
            program: name.to_string(),
            timeout_secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or_else(|| OsStr::new("process"))
        .to_string_lossy()
        .to_string()
}

fn missing_pipe(which: &str) -> ProcessError {
    ProcessError::Io(std::io::Error::other(format!("{} was not captured", which)))
}

fn spawn(program: &Path, args: &[String], name: &str) -> Result<Child, ProcessError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| {
            PROCESS_RUNS.with_label_values(&["spawn_failed"]).inc();
            ProcessError::Spawn {
                program: name.to_string(),
                source,
            }
        })
}

fn finish(name: &str, status: ExitStatus, detail: Option<String>) -> Result<(), ProcessError> {
    if status.success() {
        PROCESS_RUNS.with_label_values(&["success"]).inc();
        return Ok(());
    }
    PROCESS_RUNS.with_label_values(&["exit_error"]).inc();
    Err(ProcessError::Exit {
        program: name.to_string(),
        code: status.code(),
        detail: detail.filter(|d| !d.is_empty()),
    })
}

/// Reads both streams until EOF, interleaving lines as they arrive.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the stream,
/// so the child never blocks on a pipe nobody drains.
async fn pump_lines<O, E, F>(mut stdout: Split<O>, mut stderr: Split<E>, on_line: &mut F)
where
    O: AsyncBufRead + Unpin,
    E: AsyncBufRead + Unpin,
    F: FnMut(ProcessLine),
{
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            segment = stdout.next_segment(), if stdout_open => match segment {
                Ok(Some(bytes)) => emit(&bytes, ProcessLine::stdout, on_line),
                Ok(None) => stdout_open = false,
                Err(e) => {
                    warn!("Failed to read child stdout: {}", e);
                    stdout_open = false;
                }
            },
            segment = stderr.next_segment(), if stderr_open => match segment {
                Ok(Some(bytes)) => emit(&bytes, ProcessLine::stderr, on_line),
                Ok(None) => stderr_open = false,
                Err(e) => {
                    warn!("Failed to read child stderr: {}", e);
                    stderr_open = false;
                }
            },
        }
    }
}

fn emit<F>(raw: &[u8], make: fn(String) -> ProcessLine, on_line: &mut F)
where
    F: FnMut(ProcessLine),
{
    for segment in String::from_utf8_lossy(raw).split('\r') {
        let text = segment.trim_end();
        if !text.is_empty() {
            on_line(make(text.to_string()));
        }
    }
}
