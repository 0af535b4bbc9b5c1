//! Job log aggregation.
//!
//! [`LogHub`] stamps and splits every log call into [`LogEntry`] records,
//! forwards them to a durable [`LogSink`], keeps the most recent ones in a
//! ring buffer, and delivers them in order to registered subscribers.
//!
//! Subscribers run while the hub is locked so that a backlog snapshot taken at
//! subscription time and the live entries that follow never overlap or leave a
//! gap. Callbacks must therefore return quickly and must not log themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::metrics::{LOG_ENTRIES, LOG_WRITE_FAILURES};

/// One line of job output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub job_id: String,
    pub message: String,
}

impl LogEntry {
    /// `<timestamp> [<job id>] <message>`, as written to the log file.
    pub fn format_line(&self) -> String {
        format!(
            "{} [{}] {}",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.job_id,
            self.message
        )
    }
}

/// Durable append-only destination for log entries.
///
/// Implementations must not block and must swallow their own errors.
pub trait LogSink: Send + Sync {
    fn append(&self, entry: &LogEntry);
}

/// Handle for a registered subscriber.
pub type SubscriberId = u64;

type Subscriber = Box<dyn Fn(&LogEntry) + Send + Sync>;

struct HubState {
    recent: VecDeque<LogEntry>,
    subscribers: BTreeMap<SubscriberId, Subscriber>,
    next_subscriber: SubscriberId,
}

/// Log aggregation point shared by all jobs.
pub struct LogHub {
    state: Mutex<HubState>,
    sink: Arc<dyn LogSink>,
    capacity: usize,
}

impl LogHub {
    /// Hub keeping `capacity` recent entries (at least one).
    pub fn new(sink: Arc<dyn LogSink>, capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState {
                recent: VecDeque::new(),
                subscribers: BTreeMap::new(),
                next_subscriber: 1,
            }),
            sink,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `message` for `job_id`. Multi-line messages become one entry
    /// per non-blank line, all sharing one timestamp.
    pub fn log(&self, job_id: &str, message: &str) {
        let timestamp = Utc::now();
        let mut state = self.lock();

        for line in message.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            let entry = LogEntry {
                timestamp,
                job_id: job_id.to_string(),
                message: line.to_string(),
            };

            self.sink.append(&entry);
            LOG_ENTRIES.inc();

            for subscriber in state.subscribers.values() {
                subscriber(&entry);
            }

            state.recent.push_back(entry);
            while state.recent.len() > self.capacity {
                state.recent.pop_front();
            }
        }
    }

    /// Snapshot of the ring buffer, oldest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        self.lock().recent.iter().cloned().collect()
    }

    /// Registers a subscriber for live entries.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.subscribe_with_backlog(callback).0
    }

    /// Registers a subscriber and returns the backlog it should replay first.
    ///
    /// No entry is both in the backlog and delivered live, and none is missed.
    pub fn subscribe_with_backlog<F>(&self, callback: F) -> (SubscriberId, Vec<LogEntry>)
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        state.subscribers.insert(id, Box::new(callback));
        let backlog = state.recent.iter().cloned().collect();
        (id, backlog)
    }

    /// Removes a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.lock().subscribers.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// Logger bound to one job.
#[derive(Clone)]
pub struct JobLogger {
    hub: Arc<LogHub>,
    job_id: String,
}

impl JobLogger {
    pub fn new(hub: Arc<LogHub>, job_id: impl Into<String>) -> Self {
        Self {
            hub,
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn log(&self, message: &str) {
        self.hub.log(&self.job_id, message);
    }
}

/// Sink that discards everything.
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn append(&self, _entry: &LogEntry) {}
}

/// Sink handle feeding a [`LogFileWriter`] task.
///
/// Cheaply cloneable. Appends never block; if the writer is gone the entry is
/// dropped and the error reported through `tracing`.
#[derive(Clone)]
pub struct FileLogSink {
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl LogSink for FileLogSink {
    fn append(&self, entry: &LogEntry) {
        if let Err(e) = self.tx.send(entry.clone()) {
            tracing::error!("Failed to queue job log entry: {}", e);
        }
    }
}

/// Background task appending log entries to a file.
pub struct LogFileWriter {
    rx: mpsc::UnboundedReceiver<LogEntry>,
    path: PathBuf,
}

impl LogFileWriter {
    /// Run the writer until every [`FileLogSink`] is dropped.
    ///
    /// This should be spawned as a background task. The file is opened in
    /// append mode on first use and reopened after a failed write.
    pub async fn run(mut self) {
        tracing::info!(path = %self.path.display(), "Job log writer started");
        let mut file: Option<tokio::fs::File> = None;

        while let Some(entry) = self.rx.recv().await {
            if file.is_none() {
                match open_append(&self.path).await {
                    Ok(f) => file = Some(f),
                    Err(e) => {
                        LOG_WRITE_FAILURES.inc();
                        tracing::error!(
                            "Failed to open job log {}: {}",
                            self.path.display(),
                            e
                        );
                        continue;
                    }
                }
            }

            let Some(f) = file.as_mut() else { continue };
            let line = format!("{}\n", entry.format_line());
            if let Err(e) = f.write_all(line.as_bytes()).await {
                LOG_WRITE_FAILURES.inc();
                tracing::error!("Failed to write job log entry: {}", e);
                file = None;
                continue;
            }
            if let Err(e) = f.flush().await {
                tracing::warn!("Failed to flush job log: {}", e);
            }
        }

        tracing::info!("Job log writer shutting down");
    }
}

async fn open_append(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

/// Create a file-backed log sink.
///
/// Returns:
/// - `FileLogSink` - pass to [`LogHub::new`]
/// - `LogFileWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
pub fn create_log_file_system(path: impl Into<PathBuf>) -> (FileLogSink, LogFileWriter) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        FileLogSink { tx },
        LogFileWriter {
            rx,
            path: path.into(),
        },
    )
}
