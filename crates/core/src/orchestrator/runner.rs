//! Download job orchestrator.
//!
//! Jobs are accepted synchronously and run on the ambient tokio runtime, at
//! most `max_concurrent_jobs` at a time, in enqueue order. All queue state
//! lives in one [`JobQueue`] behind a mutex that is never held across an
//! await point.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::download::DownloadError;
use crate::metrics::{ACTIVE_JOBS, JOBS_ENQUEUED, JOBS_FINISHED, JOB_DURATION, QUEUED_JOBS};

use super::config::OrchestratorConfig;
use super::logs::{JobLogger, LogEntry, LogHub, SubscriberId};
use super::queue::JobQueue;
use super::types::{Job, JobOutcome, JobSpec, JobStats, OrchestratorError};

/// Work performed for each job once it gets a slot.
///
/// Errors become the job's failure reason; they never reach other jobs.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, job: &Job, log: &JobLogger) -> Result<JobOutcome, DownloadError>;
}

/// Bounded-concurrency FIFO job runner with in-memory history.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    queue: Mutex<JobQueue>,
    handler: Arc<dyn JobHandler>,
    logs: Arc<LogHub>,
    max_concurrent: AtomicUsize,
    max_tracked: usize,
}

impl Orchestrator {
    pub fn new(
        config: &OrchestratorConfig,
        handler: Arc<dyn JobHandler>,
        logs: Arc<LogHub>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(JobQueue::new()),
                handler,
                logs,
                max_concurrent: AtomicUsize::new(config.max_concurrent_jobs.max(1)),
                max_tracked: config.max_tracked_jobs.max(1),
            }),
        }
    }

    /// Queues a job and starts it if a slot is free. Never waits for the job.
    ///
    /// Fails only when the caller supplied a job id that is already tracked.
    pub fn enqueue(&self, spec: JobSpec) -> Result<Job, OrchestratorError> {
        let job = {
            let mut queue = self.inner.lock();
            let job = queue.push(spec)?;
            let evicted = queue.trim(self.inner.max_tracked);
            if evicted > 0 {
                debug!(evicted, "Trimmed job history");
            }
            QUEUED_JOBS.set(queue.pending_len() as i64);
            job
        };

        JOBS_ENQUEUED.inc();
        let video_note = job
            .video_id
            .as_deref()
            .map(|v| format!(" (video {})", v))
            .unwrap_or_default();
        self.inner
            .logs
            .log(&job.id, &format!("Enqueued track {}{}", job.track_id, video_note));

        self.inner.drain();
        Ok(job)
    }

    /// Looks up a tracked job. Jobs evicted from history are not found.
    pub fn job(&self, id: &str) -> Option<Job> {
        self.inner.lock().get(id)
    }

    pub fn stats(&self) -> JobStats {
        let queue = self.inner.lock();
        JobStats {
            queue_length: queue.pending_len(),
            active_jobs: queue.active(),
            max_concurrent_jobs: self.max_concurrent_jobs(),
            jobs: queue.snapshot(),
        }
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.inner.limit()
    }

    /// Changes the concurrency limit (minimum 1). Raising it starts waiting
    /// jobs immediately; lowering it lets running jobs finish.
    pub fn set_max_concurrent_jobs(&self, limit: usize) {
        self.inner.max_concurrent.store(limit.max(1), Ordering::SeqCst);
        info!(limit = limit.max(1), "Updated job concurrency limit");
        self.inner.drain();
    }

    pub fn logs(&self) -> &Arc<LogHub> {
        &self.inner.logs
    }

    pub fn recent_logs(&self) -> Vec<LogEntry> {
        self.inner.logs.recent()
    }

    /// Writes a log line attributed to `job_id`.
    pub fn log(&self, job_id: &str, message: &str) {
        self.inner.logs.log(job_id, message);
    }

    /// See [`LogHub::subscribe_with_backlog`].
    pub fn subscribe_with_backlog<F>(&self, callback: F) -> (SubscriberId, Vec<LogEntry>)
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.inner.logs.subscribe_with_backlog(callback)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.logs.unsubscribe(id)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, JobQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn limit(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst).max(1)
    }

    /// Starts pending jobs until the limit is reached or nothing is pending.
    ///
    /// Each job is claimed under the lock, so concurrent callers cannot push
    /// the running count past the limit.
    fn drain(self: &Arc<Self>) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available; jobs stay queued");
            return;
        };

        loop {
            let next = {
                let mut queue = self.lock();
                let job = queue.start_next(self.limit());
                QUEUED_JOBS.set(queue.pending_len() as i64);
                ACTIVE_JOBS.set(queue.active() as i64);
                job
            };
            let Some(job) = next else { break };

            let inner = Arc::clone(self);
            runtime.spawn(async move { inner.run(job).await });
        }
    }

    async fn run(self: Arc<Self>, job: Job) {
        let logger = JobLogger::new(Arc::clone(&self.logs), job.id.clone());
        logger.log("Starting download");
        let started = Instant::now();

        let result = AssertUnwindSafe(self.handler.execute(&job, &logger))
            .catch_unwind()
            .await;

        let failure = match result {
            Ok(Ok(outcome)) => {
                self.finish(|queue| queue.complete(&job.id, outcome));
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(format!("Unexpected job error: {}", panic_message(panic.as_ref()))),
        };

        let label = match failure {
            None => {
                logger.log("Download completed");
                "completed"
            }
            Some(message) => {
                self.finish(|queue| queue.fail(&job.id, message.clone()));
                logger.log(&format!("Download failed: {}", message));
                warn!(job_id = %job.id, track_id = %job.track_id, "Job failed: {}", message);
                "failed"
            }
        };

        JOBS_FINISHED.with_label_values(&[label]).inc();
        JOB_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        self.drain();
    }

    fn finish(&self, update: impl FnOnce(&mut JobQueue) -> Option<Job>) {
        let mut queue = self.lock();
        update(&mut queue);
        queue.trim(self.max_tracked);
        ACTIVE_JOBS.set(queue.active() as i64);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
