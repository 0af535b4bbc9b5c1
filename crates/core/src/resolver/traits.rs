//! Resolver trait.

use async_trait::async_trait;

use super::ResolutionResult;
use crate::track::Track;

/// Sink for human-readable progress lines emitted while resolving.
pub type ResolutionLog<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Determines which media video satisfies a track.
///
/// Implementations never fail: every error is folded into a failed
/// [`ResolutionResult`].
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Strategy name for logging and metrics.
    fn name(&self) -> &str;

    async fn resolve(&self, track: &Track, log: &ResolutionLog<'_>) -> ResolutionResult;
}
