//! Pending list, running counter and bounded job history.
//!
//! Pure state with no I/O; the orchestrator holds it behind a mutex and every
//! method leaves it consistent.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;

use super::types::{Job, JobOutcome, JobSpec, JobStatus, OrchestratorError};

#[derive(Debug, Default)]
pub(crate) struct JobQueue {
    pending: VecDeque<String>,
    jobs: HashMap<String, Job>,
    /// Insertion order, oldest first.
    history: VecDeque<String>,
    active: usize,
    next_id: u64,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Adds a queued job and returns a copy of it.
    pub(crate) fn push(&mut self, mut spec: JobSpec) -> Result<Job, OrchestratorError> {
        let id = match spec.job_id.take().filter(|id| !id.is_empty()) {
            Some(id) if self.jobs.contains_key(&id) => {
                return Err(OrchestratorError::DuplicateJob(id))
            }
            Some(id) => id,
            None => self.generate_id(),
        };

        let job = Job::new(id.clone(), spec);
        self.pending.push_back(id.clone());
        self.history.push_back(id.clone());
        self.jobs.insert(id, job.clone());
        Ok(job)
    }

    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("job-{}", self.next_id);
            self.next_id += 1;
            if !self.jobs.contains_key(&id) {
                return id;
            }
        }
    }

    /// Pops the oldest pending job and marks it running, if a slot is free.
    pub(crate) fn start_next(&mut self, limit: usize) -> Option<Job> {
        if self.active >= limit.max(1) {
            return None;
        }

        while let Some(id) = self.pending.pop_front() {
            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
            self.active += 1;
            return Some(job.clone());
        }
        None
    }

    pub(crate) fn complete(&mut self, id: &str, outcome: JobOutcome) -> Option<Job> {
        self.finish(id, |job| {
            job.status = JobStatus::Completed;
            job.video_id = Some(outcome.video_id);
            job.file_path = Some(outcome.file_path);
        })
    }

    pub(crate) fn fail(&mut self, id: &str, error: String) -> Option<Job> {
        self.finish(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        })
    }

    fn finish(&mut self, id: &str, apply: impl FnOnce(&mut Job)) -> Option<Job> {
        self.active = self.active.saturating_sub(1);
        let job = self.jobs.get_mut(id)?;
        apply(job);
        job.completed_at = Some(Utc::now());
        Some(job.clone())
    }

    /// Evicts terminal jobs from the oldest end until at most `max` remain.
    ///
    /// Stops at the first queued or running job, even if newer terminal jobs
    /// could be evicted. Returns the number of jobs removed.
    pub(crate) fn trim(&mut self, max: usize) -> usize {
        let mut removed = 0;
        while self.history.len() > max {
            let Some(oldest) = self.history.front() else {
                break;
            };
            match self.jobs.get(oldest).map(|job| job.status.is_terminal()) {
                Some(false) => break,
                Some(true) => {
                    self.jobs.remove(oldest);
                    removed += 1;
                }
                None => {}
            }
            self.history.pop_front();
        }
        removed
    }

    pub(crate) fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).cloned()
    }

    /// Tracked jobs, most recently enqueued first.
    pub(crate) fn snapshot(&self) -> Vec<Job> {
        self.history
            .iter()
            .rev()
            .filter_map(|id| self.jobs.get(id).cloned())
            .collect()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn active(&self) -> usize {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> JobOutcome {
        JobOutcome {
            video_id: "vid".into(),
            file_path: "downloads/a.m4a".into(),
        }
    }

    #[test]
    fn test_generated_ids_are_sequential() {
        let mut queue = JobQueue::new();
        let a = queue.push(JobSpec::new("t1")).unwrap();
        let b = queue.push(JobSpec::new("t2")).unwrap();
        assert_eq!(a.id, "job-1");
        assert_eq!(b.id, "job-2");
        assert_eq!(queue.pending_len(), 2);
    }

    #[test]
    fn test_custom_ids_and_duplicates() {
        let mut queue = JobQueue::new();
        queue.push(JobSpec::new("t1").with_job_id("job-2")).unwrap();

        let err = queue.push(JobSpec::new("t1").with_job_id("job-2")).unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateJob(id) if id == "job-2"));

        // Generated ids skip ones already taken.
        assert_eq!(queue.push(JobSpec::new("t2")).unwrap().id, "job-1");
        assert_eq!(queue.push(JobSpec::new("t3")).unwrap().id, "job-3");
    }

    #[test]
    fn test_start_next_respects_limit_and_fifo() {
        let mut queue = JobQueue::new();
        for i in 0..3 {
            queue.push(JobSpec::new(format!("t{}", i))).unwrap();
        }

        let first = queue.start_next(2).unwrap();
        let second = queue.start_next(2).unwrap();
        assert_eq!(first.id, "job-1");
        assert_eq!(second.id, "job-2");
        assert_eq!(first.status, JobStatus::Running);
        assert!(first.started_at.is_some());
        assert!(queue.start_next(2).is_none());
        assert_eq!(queue.active(), 2);

        queue.complete("job-1", outcome()).unwrap();
        assert_eq!(queue.active(), 1);
        assert_eq!(queue.start_next(2).unwrap().id, "job-3");
    }

    #[test]
    fn test_zero_limit_treated_as_one() {
        let mut queue = JobQueue::new();
        queue.push(JobSpec::new("t1")).unwrap();
        assert!(queue.start_next(0).is_some());
    }

    #[test]
    fn test_complete_and_fail_stamp_terminal_state() {
        let mut queue = JobQueue::new();
        queue.push(JobSpec::new("t1")).unwrap();
        queue.push(JobSpec::new("t2")).unwrap();
        queue.start_next(2);
        queue.start_next(2);

        let done = queue.complete("job-1", outcome()).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.file_path.as_deref(), Some("downloads/a.m4a"));
        assert!(done.completed_at.is_some());
        assert!(done.error.is_none());

        let failed = queue.fail("job-2", "Track not found".into()).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("Track not found"));
        assert_eq!(queue.active(), 0);
    }

    #[test]
    fn test_trim_stops_at_oldest_non_terminal() {
        let mut queue = JobQueue::new();
        for i in 0..4 {
            queue.push(JobSpec::new(format!("t{}", i))).unwrap();
        }
        // job-1 still running, job-2 finished.
        queue.start_next(2);
        queue.start_next(2);
        queue.fail("job-2", "boom".into());

        assert_eq!(queue.trim(2), 0);
        assert_eq!(queue.tracked(), 4);
        assert!(queue.get("job-2").is_some());

        queue.complete("job-1", outcome());
        assert_eq!(queue.trim(2), 2);
        assert!(queue.get("job-1").is_none());
        assert!(queue.get("job-2").is_none());
        assert!(queue.get("job-3").is_some());
    }

    #[test]
    fn test_snapshot_newest_first() {
        let mut queue = JobQueue::new();
        for i in 0..3 {
            queue.push(JobSpec::new(format!("t{}", i))).unwrap();
        }
        let ids: Vec<_> = queue.snapshot().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["job-3", "job-2", "job-1"]);
    }
}
