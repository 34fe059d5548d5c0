use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rate_limit::LimitTier;

// Image entry as it appears in artwork API responses
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ImageDescriptor {
    pub url: String,
    #[serde(default)]
    pub degraded: bool,
}

// Artwork API response body, only the part we look at
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ArtworkResponse {
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

// Precomputed degraded flag from the caller
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SignalRequest {
    pub degraded: bool,
}

// Authoritative limit from a caller that knows the reset time
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SetLimitRequest {
    pub tier: LimitTier,
    #[serde(default)]
    pub reset_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LinkifyRequest {
    pub text: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LinkifyResponse {
    pub html: String,
    pub cached: bool,
}
