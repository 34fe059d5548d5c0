use clap::Parser;
use std::time::Duration;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "fedart-gateway")]
#[command(about = "Rate-limit tracking and comment linkification for the artwork frontend")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Linkify cache TTL in seconds
    #[arg(short, long, default_value_t = 30)]
    pub cache_ttl: u64,

    // Max rendered comments kept in the cache
    #[arg(long, default_value_t = 1024)]
    pub cache_capacity: usize,

    // How often limited sessions are checked for expiry (seconds)
    #[arg(long, default_value_t = 10)]
    pub expiry_interval: u64,

    // Display duration of the degraded-content toast
    #[arg(long, default_value_t = 6000)]
    pub toast_duration_ms: u64,

    // Seconds an unread toast is kept for a session that never polls
    #[arg(long, default_value_t = 60)]
    pub toast_retention: u64,

    // Toast channel capacity
    #[arg(long, default_value_t = 100)]
    pub toast_queue: usize,

    // Largest comment body accepted by /api/linkify, in bytes
    #[arg(long, default_value_t = 65536)]
    pub max_text_len: usize,
}

impl Args {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn expiry_interval(&self) -> Duration {
        // interval() panics on a zero period
        Duration::from_secs(self.expiry_interval.max(1))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn toast_retention(&self) -> Duration {
        Duration::from_secs(self.toast_retention)
    }
}

impl Default for Args {
    fn default() -> Self {
        Self {
            port: 8080,
            cache_ttl: 30,
            cache_capacity: 1024,
            expiry_interval: 10,
            toast_duration_ms: 6000,
            toast_retention: 60,
            toast_queue: 100,
            max_text_len: 65536,
        }
    }
}
