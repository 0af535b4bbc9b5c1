use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use trackfetch_core::Track;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Get a track, including its download status and file path.
pub async fn get_track(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Track>, ApiError> {
    match state.store().get(&id) {
        Ok(Some(track)) => Ok(Json(track)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Track not found")),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
