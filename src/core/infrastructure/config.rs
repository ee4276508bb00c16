//! HTTP client configuration.

use std::num::NonZeroU32;
use std::time::Duration;

/// Client-side token bucket applied to every API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: NonZeroU32,
    pub burst_size: NonZeroU32,
}

impl RateLimitConfig {
    /// A limit of `requests_per_second` with an equal burst.
    pub fn per_second(requests_per_second: NonZeroU32) -> Self {
        Self {
            requests_per_second,
            burst_size: requests_per_second,
        }
    }
}

/// Settings of the HTTP client talking to the Proxmox VE API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Tickets older than this are refreshed before the next request.
    pub ticket_lifetime: Duration,
    /// Timeout of every single request.
    pub timeout: Duration,
    pub rate_limit: Option<RateLimitConfig>,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ticket_lifetime: Duration::from_secs(2 * 60 * 60),
            timeout: Duration::from_secs(30),
            rate_limit: None,
            accept_invalid_certs: false,
        }
    }
}
