//! Types for the download job orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the orchestrator's own API.
///
/// Failures inside a job never surface here; they are recorded on the job.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job id already in use: {0}")]
    DuplicateJob(String),

    #[error("job not found: {0}")]
    JobNotFound(String),
}

/// Job lifecycle state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Request to download one track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Assigned as `job-N` when absent.
    #[serde(default)]
    pub job_id: Option<String>,
    pub track_id: String,
    /// Known media id; resolved when absent.
    #[serde(default)]
    pub video_id: Option<String>,
    /// Display hints only.
    #[serde(default)]
    pub track_name: Option<String>,
    #[serde(default)]
    pub artists: Vec<String>,
}

impl JobSpec {
    pub fn new(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            ..Default::default()
        }
    }

    pub fn with_video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// A unit of queued work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub track_id: String,
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artists: Vec<String>,
    pub status: JobStatus,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when `status` is `Failed`.
    pub error: Option<String>,
    /// Relative path of the extracted file, set on success.
    pub file_path: Option<String>,
}

impl Job {
    pub fn new(id: String, spec: JobSpec) -> Self {
        Self {
            id,
            track_id: spec.track_id,
            video_id: spec.video_id.filter(|v| !v.is_empty()),
            track_name: spec.track_name,
            artists: spec.artists,
            status: JobStatus::Queued,
            enqueued_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            file_path: None,
        }
    }
}

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub video_id: String,
    pub file_path: String,
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub queue_length: usize,
    pub active_jobs: usize,
    pub max_concurrent_jobs: usize,
    /// Most recently enqueued first.
    pub jobs: Vec<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_spec_from_request_body() {
        let spec: JobSpec = serde_json::from_str(r#"{"trackId": "t1", "videoId": "abc"}"#).unwrap();
        assert_eq!(spec.track_id, "t1");
        assert_eq!(spec.video_id.as_deref(), Some("abc"));
        assert!(spec.job_id.is_none());
    }

    #[test]
    fn test_empty_video_id_is_unknown() {
        let job = Job::new("job-1".into(), JobSpec::new("t1").with_video_id(""));
        assert!(job.video_id.is_none());
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[test]
    fn test_job_serialization() {
        let job = Job::new("job-1".into(), JobSpec::new("t1"));
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["id"], "job-1");
        assert_eq!(json["trackId"], "t1");
        assert_eq!(json["status"], "queued");
        assert!(json["startedAt"].is_null());
        assert!(json.get("artists").is_none());
    }
}
