use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref LINKIFY_TOTAL: Counter =
        register_counter!("fedart_linkify_requests_total", "Total number of linkify requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("fedart_linkify_cache_hits_total", "Total linkify cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("fedart_linkify_cache_misses_total", "Total linkify cache misses").unwrap();
    pub static ref LINKIFY_LATENCY: Histogram = register_histogram!(
        "fedart_linkify_latency_seconds",
        "Linkify latency in seconds"
    )
    .unwrap();
    pub static ref DEGRADED_SIGNALS: Counter =
        register_counter!("fedart_degraded_signals_total", "Responses observed carrying degraded images").unwrap();
    pub static ref TOASTS_DISPATCHED: Counter =
        register_counter!("fedart_toasts_dispatched_total", "Rate-limit notifications queued").unwrap();
    pub static ref LIMITED_SESSIONS: Gauge =
        register_gauge!("fedart_limited_sessions", "Sessions currently in a rate-limit episode").unwrap();
}
