use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use super::session_id;
use crate::error::ApiError;
use crate::metrics::{DEGRADED_SIGNALS, LIMITED_SESSIONS};
use crate::models::{ArtworkResponse, SetLimitRequest, SignalRequest};
use crate::rate_limit::{RateLimitState, has_degraded_images};
use crate::state::AppState;
use crate::toast::ChannelToastSink;

// Keep the gauge in step with one session's transition
fn track_transition(was_limited: bool, is_limited: bool) {
    match (was_limited, is_limited) {
        (false, true) => LIMITED_SESSIONS.inc(),
        (true, false) => LIMITED_SESSIONS.dec(),
        _ => {}
    }
}

// Apply a degraded/not-degraded observation to the session's tracker
fn apply_signal(state: &AppState, session: &str, degraded: bool) -> RateLimitState {
    if !degraded {
        // a clean response changes nothing, so don't allocate a tracker for it
        return state.view(session, Utc::now()).0;
    }
    DEGRADED_SIGNALS.inc();

    let sink = ChannelToastSink::new(session, &state.toast_tx);
    let mut tracker = state.tracker(session);
    if tracker.process_response_signal(true, &sink) {
        debug!(session, "degraded content observed");
        track_transition(false, true);
    }
    tracker.state()
}

pub async fn rate_limit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RateLimitState>, ApiError> {
    let session = session_id(&headers)?;
    // catch up with an elapsed reset time the periodic sweep has not seen yet
    let (view, expired) = state.view(&session, Utc::now());
    if expired {
        track_transition(true, false);
    }
    Ok(Json(view))
}

pub async fn signal_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SignalRequest>,
) -> Result<Json<RateLimitState>, ApiError> {
    let session = session_id(&headers)?;
    Ok(Json(apply_signal(&state, &session, payload.degraded)))
}

pub async fn artwork_signal_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ArtworkResponse>,
) -> Result<Json<RateLimitState>, ApiError> {
    let session = session_id(&headers)?;
    let degraded = has_degraded_images(&payload.images);
    Ok(Json(apply_signal(&state, &session, degraded)))
}

pub async fn set_limit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SetLimitRequest>,
) -> Result<Json<RateLimitState>, ApiError> {
    let session = session_id(&headers)?;
    let sink = ChannelToastSink::new(&session, &state.toast_tx);
    let mut tracker = state.tracker(&session);
    let was_limited = tracker.is_limited();
    tracker.set_limited(payload.tier, payload.reset_at, &sink);
    track_transition(was_limited, tracker.is_limited());
    Ok(Json(tracker.state()))
}

pub async fn clear_limit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RateLimitState>, ApiError> {
    let session = session_id(&headers)?;
    // a cleared tracker is indistinguishable from no tracker
    if let Some((_, mut tracker)) = state.sessions.remove(&session) {
        let was_limited = tracker.is_limited();
        tracker.clear_limit();
        track_transition(was_limited, false);
    }
    Ok(Json(RateLimitState::default()))
}
