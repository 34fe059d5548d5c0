mod health;
mod linkify;
mod metrics;
mod rate_limit;
mod toasts;

use axum::http::HeaderMap;

use crate::error::ApiError;

pub use health::health_handler;
pub use linkify::linkify_handler;
pub use metrics::metrics_handler;
pub use rate_limit::{
    artwork_signal_handler, clear_limit_handler, rate_limit_handler, set_limit_handler,
    signal_handler,
};
pub use toasts::toasts_handler;

pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "anonymous";
const MAX_SESSION_LEN: usize = 128;

// Session id from the request header, "anonymous" when absent
pub(crate) fn session_id(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(SESSION_HEADER) else {
        return Ok(DEFAULT_SESSION.to_string());
    };
    let id = value.to_str().map_err(|_| ApiError::InvalidSession)?.trim();
    if id.is_empty() || id.len() > MAX_SESSION_LEN {
        return Err(ApiError::InvalidSession);
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_uses_default_session() {
        assert_eq!(session_id(&HeaderMap::new()).unwrap(), DEFAULT_SESSION);
    }

    #[test]
    fn header_value_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static(" abc "));
        assert_eq!(session_id(&headers).unwrap(), "abc");
    }

    #[test]
    fn blank_or_oversized_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(session_id(&headers), Err(ApiError::InvalidSession)));

        let long = "x".repeat(MAX_SESSION_LEN + 1);
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&long).unwrap());
        assert!(matches!(session_id(&headers), Err(ApiError::InvalidSession)));
    }
}
