pub mod cache;
pub mod config;
pub mod error;
pub mod expiry;
pub mod handlers;
pub mod linkify;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod sanitize;
pub mod state;
pub mod toast;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{
    artwork_signal_handler, clear_limit_handler, health_handler, linkify_handler,
    metrics_handler, rate_limit_handler, set_limit_handler, signal_handler, toasts_handler,
};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/linkify", post(linkify_handler))
        .route(
            "/api/rate-limit",
            get(rate_limit_handler)
                .put(set_limit_handler)
                .delete(clear_limit_handler),
        )
        .route("/api/rate-limit/signal", post(signal_handler))
        .route("/api/rate-limit/artworks", post(artwork_signal_handler))
        .route("/api/toasts", get(toasts_handler))
        .with_state(state)
}
