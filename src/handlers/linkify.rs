use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::make_cache_key;
use crate::error::ApiError;
use crate::linkify::linkify;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, LINKIFY_LATENCY, LINKIFY_TOTAL};
use crate::models::{LinkifyRequest, LinkifyResponse};
use crate::state::AppState;

pub async fn linkify_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LinkifyRequest>,
) -> Result<Json<LinkifyResponse>, ApiError> {
    LINKIFY_TOTAL.inc();

    if payload.text.len() > state.max_text_len {
        return Err(ApiError::TextTooLong {
            len: payload.text.len(),
            limit: state.max_text_len,
        });
    }

    let start_time = Instant::now();
    let cache_key = make_cache_key(&payload.text);

    // check cache first
    let response = match state.cache.get(&cache_key) {
        Some(html) => {
            CACHE_HITS.inc();
            LinkifyResponse { html, cached: true }
        }
        None => {
            CACHE_MISSES.inc();
            let html = linkify(&payload.text);
            state.cache.insert(cache_key, html.clone());
            LinkifyResponse { html, cached: false }
        }
    };

    LINKIFY_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(response))
}
