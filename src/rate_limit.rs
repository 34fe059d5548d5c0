// Degraded-content tracking, one tracker per session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::models::ImageDescriptor;
use crate::toast::ToastSink;

pub const DEGRADED_MESSAGE: &str =
    "You're browsing fast! Images are temporarily shown at reduced quality.";
pub const DEGRADED_TOAST_DURATION: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitTier {
    #[default]
    Normal,
    Warning,
    SoftLimit,
    HardLimit,
}

// Read-only view handed to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateLimitState {
    pub is_limited: bool,
    pub tier: LimitTier,
    pub reset_at: Option<DateTime<Utc>>,
    pub toast_shown: bool,
}

// One session's limit state. `toast_shown` implies `is_limited`.
#[derive(Debug, Clone)]
pub struct RateLimitTracker {
    state: RateLimitState,
    toast_duration: Duration,
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new(DEGRADED_TOAST_DURATION)
    }
}

impl RateLimitTracker {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            state: RateLimitState::default(),
            toast_duration,
        }
    }

    pub fn state(&self) -> RateLimitState {
        self.state
    }

    pub fn is_limited(&self) -> bool {
        self.state.is_limited
    }

    // React to an ordinary API response. Only the first degraded response of
    // an episode does anything; a clean response is not a clearing signal.
    // Returns true when the call started a new episode.
    pub fn process_response_signal(&mut self, has_degraded_marker: bool, toasts: &dyn ToastSink) -> bool {
        if !has_degraded_marker || self.state.is_limited {
            return false;
        }
        // reset time is not available on this path
        self.set_limited(LimitTier::SoftLimit, None, toasts);
        true
    }

    // Enter (or update) a penalty episode. Setting `Normal` clears it.
    pub fn set_limited(&mut self, tier: LimitTier, reset_at: Option<DateTime<Utc>>, toasts: &dyn ToastSink) {
        if tier == LimitTier::Normal {
            self.clear_limit();
            return;
        }

        self.state.is_limited = true;
        self.state.tier = tier;
        self.state.reset_at = reset_at;

        if !self.state.toast_shown {
            toasts.dispatch(DEGRADED_MESSAGE, self.toast_duration);
            self.state.toast_shown = true;
            info!(?tier, ?reset_at, "entered rate-limit episode");
        }
    }

    // Clear the episode if its reset time has passed. An unknown reset
    // time never expires on its own.
    // Returns true when the state was cleared.
    pub fn check_expiry(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.reset_at {
            Some(reset_at) if self.state.is_limited && now >= reset_at => {
                self.clear_limit();
                true
            }
            _ => false,
        }
    }

    pub fn clear_limit(&mut self) {
        if self.state.is_limited {
            info!(tier = ?self.state.tier, "rate-limit episode cleared");
        }
        self.state = RateLimitState::default();
    }
}

// True when any image in an artwork response was served degraded.
pub fn has_degraded_images(images: &[ImageDescriptor]) -> bool {
    images.iter().any(|img| img.degraded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<(String, Duration)>>,
    }

    impl ToastSink for RecordingSink {
        fn dispatch(&self, message: &str, duration: Duration) {
            self.sent.borrow_mut().push((message.to_string(), duration));
        }
    }

    fn image(degraded: bool) -> ImageDescriptor {
        ImageDescriptor {
            url: "https://cdn.test/a.webp".to_string(),
            degraded,
        }
    }

    #[test]
    fn starts_unlimited() {
        let tracker = RateLimitTracker::default();
        assert_eq!(tracker.state(), RateLimitState::default());
        assert_eq!(tracker.state().tier, LimitTier::Normal);
    }

    #[test]
    fn degraded_signal_notifies_once() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();

        assert!(tracker.process_response_signal(true, &sink));
        let state = tracker.state();
        assert!(state.is_limited);
        assert!(state.toast_shown);
        assert_eq!(state.tier, LimitTier::SoftLimit);
        assert_eq!(state.reset_at, None);

        assert!(!tracker.process_response_signal(true, &sink));
        let sent = sink.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], (DEGRADED_MESSAGE.to_string(), Duration::from_secs(6)));
    }

    #[test]
    fn clean_signal_is_a_noop() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        assert!(!tracker.process_response_signal(false, &sink));
        assert!(!tracker.is_limited());

        tracker.process_response_signal(true, &sink);
        tracker.process_response_signal(false, &sink);
        assert!(tracker.is_limited());
    }

    #[test]
    fn expiry_clears_past_reset() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        let now = Utc::now();
        tracker.set_limited(LimitTier::HardLimit, Some(now - ChronoDuration::seconds(1)), &sink);

        assert!(tracker.check_expiry(now));
        let state = tracker.state();
        assert_eq!(state.tier, LimitTier::Normal);
        assert!(!state.is_limited);
        assert!(!state.toast_shown);
        assert_eq!(state.reset_at, None);
    }

    #[test]
    fn expiry_waits_for_future_reset() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        let now = Utc::now();
        let reset = now + ChronoDuration::seconds(30);
        tracker.set_limited(LimitTier::Warning, Some(reset), &sink);

        assert!(!tracker.check_expiry(now));
        assert!(tracker.is_limited());
        assert!(tracker.check_expiry(reset));
    }

    #[test]
    fn unknown_reset_never_expires() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        tracker.process_response_signal(true, &sink);

        assert!(!tracker.check_expiry(Utc::now() + ChronoDuration::days(365)));
        assert!(tracker.is_limited());

        tracker.clear_limit();
        assert_eq!(tracker.state(), RateLimitState::default());
    }

    #[test]
    fn new_episode_after_clear_notifies_again() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        tracker.process_response_signal(true, &sink);
        tracker.clear_limit();
        tracker.process_response_signal(true, &sink);
        assert_eq!(sink.sent.borrow().len(), 2);
    }

    #[test]
    fn escalation_within_episode_keeps_single_toast() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        tracker.process_response_signal(true, &sink);
        tracker.set_limited(LimitTier::HardLimit, None, &sink);

        assert_eq!(tracker.state().tier, LimitTier::HardLimit);
        assert_eq!(sink.sent.borrow().len(), 1);
    }

    #[test]
    fn setting_normal_clears() {
        let sink = RecordingSink::default();
        let mut tracker = RateLimitTracker::default();
        tracker.process_response_signal(true, &sink);
        tracker.set_limited(LimitTier::Normal, None, &sink);
        assert_eq!(tracker.state(), RateLimitState::default());
    }

    #[test]
    fn degraded_images_detection() {
        assert!(!has_degraded_images(&[]));
        assert!(!has_degraded_images(&[image(false), image(false)]));
        assert!(has_degraded_images(&[image(false), image(true)]));
    }

    #[test]
    fn tier_serializes_in_screaming_case() {
        let json = serde_json::to_string(&LimitTier::SoftLimit).unwrap();
        assert_eq!(json, "\"SOFT_LIMIT\"");
    }
}
