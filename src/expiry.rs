use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::metrics::LIMITED_SESSIONS;
use crate::state::AppState;

// One pass over every session; returns how many episodes ended.
// Idle trackers and toasts past their retention are dropped too.
pub fn sweep_expired(state: &AppState) -> usize {
    let now = Utc::now();
    let mut cleared = 0;

    for mut tracker in state.sessions.iter_mut() {
        if tracker.check_expiry(now) {
            info!(session = %tracker.key(), "rate limit expired");
            cleared += 1;
        }
    }

    let pruned = state.prune_idle();
    if pruned > 0 {
        debug!(pruned, "idle sessions dropped");
    }
    // every tracker left is in an episode
    LIMITED_SESSIONS.set(state.sessions.len() as f64);

    let cutoff = chrono::Duration::from_std(state.toast_retention)
        .ok()
        .and_then(|retention| now.checked_sub_signed(retention));
    if let Some(cutoff) = cutoff {
        let dropped = state.toasts.prune(cutoff);
        if dropped > 0 {
            debug!(dropped, "unread toasts expired");
        }
    }

    cleared
}

// Expiry loop - runs every `check_interval` until the guard is dropped

pub struct ExpiryChecker {
    handle: JoinHandle<()>,
}

impl ExpiryChecker {
    pub fn start(state: Arc<AppState>, check_interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval(check_interval);

            info!(interval = ?check_interval, "expiry checker started");

            loop {
                interval.tick().await;
                let cleared = sweep_expired(&state);
                if cleared > 0 {
                    debug!(cleared, "expiry sweep finished");
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ExpiryChecker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("expiry checker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use crate::rate_limit::LimitTier;
    use crate::toast::{ChannelToastSink, ToastSink};

    fn state() -> Arc<AppState> {
        let (state, _rx) = AppState::new(&Args::default());
        Arc::new(state)
    }

    #[tokio::test]
    async fn sweep_clears_only_elapsed_limits() {
        let state = state();
        let past = Utc::now() - chrono::Duration::seconds(5);
        let future = Utc::now() + chrono::Duration::hours(1);
        {
            let sink = ChannelToastSink::new("past", &state.toast_tx);
            state.tracker("past").set_limited(LimitTier::SoftLimit, Some(past), &sink);
        }
        {
            let sink = ChannelToastSink::new("future", &state.toast_tx);
            state.tracker("future").set_limited(LimitTier::SoftLimit, Some(future), &sink);
        }
        {
            let sink = ChannelToastSink::new("unknown", &state.toast_tx);
            state.tracker("unknown").process_response_signal(true, &sink);
        }

        assert_eq!(sweep_expired(&state), 1);
        assert!(!state.sessions.contains_key("past"));
        assert!(state.tracker("future").is_limited());
        assert!(state.tracker("unknown").is_limited());
    }

    #[tokio::test]
    async fn sweep_drops_idle_sessions_and_old_toasts() {
        let (state, _rx) = AppState::new(&Args {
            toast_retention: 0,
            ..Args::default()
        });
        for i in 0..500 {
            state.tracker(&format!("idle-{i}"));
        }
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        ChannelToastSink::new("idle-0", &tx).dispatch("stale", Duration::from_secs(1));
        state.toasts.push(rx.try_recv().unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;

        sweep_expired(&state);
        assert!(state.sessions.is_empty());
        assert!(state.toasts.is_empty());
    }

    #[tokio::test]
    async fn checker_runs_until_dropped() {
        let state = state();
        {
            let sink = ChannelToastSink::new("s", &state.toast_tx);
            let reset = Utc::now() - chrono::Duration::seconds(1);
            state.tracker("s").set_limited(LimitTier::HardLimit, Some(reset), &sink);
        }

        let checker = ExpiryChecker::start(Arc::clone(&state), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(checker.is_running());
        assert!(!state.sessions.contains_key("s"));

        drop(checker);
        {
            let sink = ChannelToastSink::new("s", &state.toast_tx);
            let reset = Utc::now() - chrono::Duration::seconds(1);
            state.tracker("s").set_limited(LimitTier::HardLimit, Some(reset), &sink);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(state.tracker("s").is_limited());
    }
}
