//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the download job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum jobs running at once. Values below 1 are treated as 1.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Jobs kept in history. Older finished jobs are evicted first; queued
    /// and running jobs are never evicted.
    #[serde(default = "default_max_tracked_jobs")]
    pub max_tracked_jobs: usize,

    /// Log entries kept in memory for replay to late subscribers.
    #[serde(default = "default_max_recent_logs")]
    pub max_recent_logs: usize,

    /// Append-only job log file.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_max_concurrent_jobs() -> usize {
    1
}

fn default_max_tracked_jobs() -> usize {
    200
}

fn default_max_recent_logs() -> usize {
    300
}

fn default_log_file() -> PathBuf {
    PathBuf::from("data/download-jobs.log")
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_tracked_jobs: default_max_tracked_jobs(),
            max_recent_logs: default_max_recent_logs(),
            log_file: default_log_file(),
        }
    }
}
