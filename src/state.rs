use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cache::LinkifyCache;
use crate::config::Args;
use crate::rate_limit::{RateLimitState, RateLimitTracker};
use crate::toast::{Toast, ToastBoard};

// app's shared state

pub struct AppState {
    pub sessions: DashMap<String, RateLimitTracker>, // session id -> tracker
    pub cache: LinkifyCache,
    pub toast_tx: mpsc::Sender<Toast>,
    pub toasts: Arc<ToastBoard>,
    pub toast_duration: Duration,
    pub toast_retention: Duration,
    pub max_text_len: usize,
}

impl AppState {
    // Build the state plus the receiving end the toast worker should drain.
    pub fn new(args: &Args) -> (Self, mpsc::Receiver<Toast>) {
        let (toast_tx, toast_rx) = mpsc::channel(args.toast_queue.max(1));
        let state = Self {
            sessions: DashMap::new(),
            cache: LinkifyCache::new(args.cache_ttl(), args.cache_capacity),
            toast_tx,
            toasts: Arc::new(ToastBoard::new()),
            toast_duration: args.toast_duration(),
            toast_retention: args.toast_retention(),
            max_text_len: args.max_text_len,
        };
        (state, toast_rx)
    }

    // The session's tracker, created on first use. Holding the returned
    // guard serializes all mutation of that session.
    pub fn tracker(&self, session: &str) -> RefMut<'_, String, RateLimitTracker> {
        let duration = self.toast_duration;
        self.sessions
            .entry(session.to_string())
            .or_insert_with(|| RateLimitTracker::new(duration))
    }

    // Read-only lookup; unknown sessions get the default view and no entry.
    // The bool is true when an elapsed reset time was applied.
    pub fn view(&self, session: &str, now: DateTime<Utc>) -> (RateLimitState, bool) {
        match self.sessions.get_mut(session) {
            Some(mut tracker) => {
                let expired = tracker.check_expiry(now);
                (tracker.state(), expired)
            }
            None => (RateLimitState::default(), false),
        }
    }

    // Trackers back in the default state carry nothing worth keeping
    pub fn prune_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, tracker| tracker.is_limited());
        before.saturating_sub(self.sessions.len())
    }
}
