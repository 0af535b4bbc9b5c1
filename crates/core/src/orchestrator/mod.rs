//! Download job orchestration.
//!
//! The [`Orchestrator`] owns the job queue: it accepts [`JobSpec`]s without
//! blocking, runs them through a [`JobHandler`] with bounded concurrency in
//! FIFO order, and keeps a bounded, insertion-ordered history that never
//! evicts queued or running jobs.
//!
//! Everything a job reports goes through the [`LogHub`], which fans entries
//! out to a durable [`LogSink`], an in-memory ring buffer and live
//! subscribers.

mod config;
mod logs;
mod queue;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use logs::{
    create_log_file_system, FileLogSink, JobLogger, LogEntry, LogFileWriter, LogHub, LogSink,
    NullLogSink, SubscriberId,
};
pub use runner::{JobHandler, Orchestrator};
pub use types::{Job, JobOutcome, JobSpec, JobStats, JobStatus, OrchestratorError};
