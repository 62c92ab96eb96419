//! Concrete stock-media provider implementations.

mod openverse;
mod pexels;

pub use openverse::OpenverseProvider;
pub use pexels::PexelsProvider;

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reelsmith_common::{Error, Result};
use reqwest::StatusCode;

pub(crate) type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token-bucket limiter allowing `per_second` requests per second.
pub(crate) fn limiter(per_second: u32) -> Limiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

pub(crate) fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reelsmith/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::configuration(format!("{provider}: cannot build HTTP client: {e}")))
}

/// Turn a non-success response into a provider error.
pub(crate) fn check_status(
    provider: &str,
    term: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authentication rejected (HTTP {})", status.as_u16())
        }
        StatusCode::TOO_MANY_REQUESTS => "rate limited (HTTP 429)".to_string(),
        _ => format!("HTTP {status}"),
    };
    Err(Error::provider(provider, term, message))
}

pub(crate) fn api_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trims_slash() {
        assert_eq!(
            api_url("https://api.pexels.com/", "/videos/search"),
            "https://api.pexels.com/videos/search"
        );
        assert_eq!(api_url("http://127.0.0.1:9", "/v1/images/"), "http://127.0.0.1:9/v1/images/");
    }
}
