//! Resolution result types.

use serde::{Deserialize, Serialize};

/// Outcome of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Success,
    Failure,
}

/// Why a resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionFailure {
    /// No search query could be built from the track.
    QueryUnavailable,
    /// The search returned nothing usable.
    NoResults,
    /// The model's final answer contained no JSON verdict.
    Unparseable,
    /// The conversation ran out of turns.
    TurnBudgetExceeded,
    /// The model claimed success without naming a video.
    MissingVideoId,
    /// The model reported that no trustworthy match exists.
    Declined,
    /// The model or search provider failed.
    Provider,
}

/// Result of one resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub status: ResolutionStatus,
    pub video_id: Option<String>,
    /// Search invocations performed.
    pub attempts: u32,
    pub reason: String,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ResolutionFailure>,
}

impl ResolutionResult {
    pub fn success(video_id: impl Into<String>, attempts: u32, reason: impl Into<String>) -> Self {
        Self {
            status: ResolutionStatus::Success,
            video_id: Some(video_id.into()),
            attempts,
            reason: reason.into(),
            error: None,
            failure: None,
        }
    }

    pub fn failure(
        kind: ResolutionFailure,
        attempts: u32,
        reason: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            status: ResolutionStatus::Failure,
            video_id: None,
            attempts,
            reason: reason.into(),
            error,
            failure: Some(kind),
        }
    }

    /// The video id, only when the resolution succeeded.
    pub fn matched_video(&self) -> Option<&str> {
        match self.status {
            ResolutionStatus::Success => self.video_id.as_deref().filter(|id| !id.is_empty()),
            ResolutionStatus::Failure => None,
        }
    }

    /// Message recorded on the job and track when the resolution failed.
    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| Some(self.reason.as_str()).filter(|r| !r.is_empty()))
            .unwrap_or("Unable to find matching YouTube video")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matched_video() {
        let ok = ResolutionResult::success("abc", 1, "top hit");
        assert_eq!(ok.matched_video(), Some("abc"));

        let failed = ResolutionResult::failure(ResolutionFailure::NoResults, 0, "none", None);
        assert_eq!(failed.matched_video(), None);
    }

    #[test]
    fn test_failure_message_precedence() {
        let with_error = ResolutionResult::failure(
            ResolutionFailure::Provider,
            2,
            "LLM workflow failed",
            Some("API error: 500 - boom".into()),
        );
        assert_eq!(with_error.failure_message(), "API error: 500 - boom");

        let reason_only = ResolutionResult::failure(ResolutionFailure::Declined, 3, "only covers", None);
        assert_eq!(reason_only.failure_message(), "only covers");

        let bare = ResolutionResult::failure(ResolutionFailure::Declined, 3, "", None);
        assert_eq!(bare.failure_message(), "Unable to find matching YouTube video");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ResolutionResult::success("abc", 1, "r")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["videoId"], "abc");
        assert!(json.get("failure").is_none());
    }
}
