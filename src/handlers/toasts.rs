use axum::{Json, extract::State, http::HeaderMap};
use std::sync::Arc;

use super::session_id;
use crate::error::ApiError;
use crate::state::AppState;
use crate::toast::Toast;

// Pending notifications for the session; each toast is returned once
pub async fn toasts_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Toast>>, ApiError> {
    let session = session_id(&headers)?;
    Ok(Json(state.toasts.drain(&session)))
}
