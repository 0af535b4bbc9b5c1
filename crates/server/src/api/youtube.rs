//! Direct media URL downloads.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use trackfetch_core::{DirectDownloadError, DirectDownloadResult};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DirectDownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Schedule downloads for a YouTube video or playlist URL.
pub async fn direct_download(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DirectDownloadRequest>,
) -> Result<Json<DirectDownloadResult>, ApiError> {
    let url = request.url.unwrap_or_default();
    match state.direct_downloads().schedule(url.trim()).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if !matches!(e, DirectDownloadError::InvalidUrl) {
                warn!(url = %url, error = %e, "Direct download failed");
            }
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}
