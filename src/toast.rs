use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::metrics::TOASTS_DISPATCHED;

// A notification waiting to be shown by the frontend
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub session: String,
    pub message: String,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

// Where rate-limit notifications go. Implementations must not block.
pub trait ToastSink {
    fn dispatch(&self, message: &str, duration: Duration);
}

static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(1);

// Sink bound to one session, forwards into the toast worker's queue
pub struct ChannelToastSink<'a> {
    session: &'a str,
    tx: &'a mpsc::Sender<Toast>,
}

impl<'a> ChannelToastSink<'a> {
    pub fn new(session: &'a str, tx: &'a mpsc::Sender<Toast>) -> Self {
        Self { session, tx }
    }
}

impl ToastSink for ChannelToastSink<'_> {
    fn dispatch(&self, message: &str, duration: Duration) {
        let toast = Toast {
            id: NEXT_TOAST_ID.fetch_add(1, Ordering::Relaxed),
            session: self.session.to_string(),
            message: message.to_string(),
            duration_ms: duration.as_millis() as u64,
            created_at: Utc::now(),
        };
        // fire and forget
        match self.tx.try_send(toast) {
            Ok(()) => TOASTS_DISPATCHED.inc(),
            Err(TrySendError::Full(toast)) => {
                warn!(session = %toast.session, "toast queue full, dropping notification");
            }
            Err(TrySendError::Closed(toast)) => {
                warn!(session = %toast.session, "toast worker gone, dropping notification");
            }
        }
    }
}

// Pending toasts per session, drained when the frontend polls
#[derive(Default)]
pub struct ToastBoard {
    pending: DashMap<String, Vec<Toast>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, toast: Toast) {
        self.pending.entry(toast.session.clone()).or_default().push(toast);
    }

    // Drop toasts created before `cutoff`, and sessions left with none
    pub fn prune(&self, cutoff: DateTime<Utc>) -> usize {
        let mut dropped = 0;
        self.pending.retain(|_, toasts| {
            let before = toasts.len();
            toasts.retain(|t| t.created_at >= cutoff);
            dropped += before - toasts.len();
            !toasts.is_empty()
        });
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&self, session: &str) -> Vec<Toast> {
        self.pending
            .remove(session)
            .map(|(_, toasts)| toasts)
            .unwrap_or_default()
    }
}

// Background worker -> files queued toasts onto the board
pub async fn toast_worker(mut rx: mpsc::Receiver<Toast>, board: Arc<ToastBoard>) {
    info!("toast worker started");

    while let Some(toast) = rx.recv().await {
        debug!(session = %toast.session, id = toast.id, "toast queued");
        board.push(toast);
    }

    info!("toast worker stopped");
}
