//! In-memory log sink for testing.

use std::sync::Mutex;

use crate::orchestrator::{LogEntry, LogSink};

/// Sink that keeps every entry in memory.
#[derive(Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Messages logged for one job, in order.
    pub fn messages_for(&self, job_id: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.job_id == job_id)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}
