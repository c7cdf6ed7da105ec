//! Rate-limit detection and backoff for the search endpoint.

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::HeaderMap;
use std::time::Duration;

pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Upper bound for the exponential fallback, in seconds.
const MAX_BACKOFF_SECS: u64 = 60;

/// Waits out a backoff period between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Default sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// A 403 counts as rate limiting when the body mentions it or the quota
/// header reports nothing left.
pub fn is_rate_limited(headers: &HeaderMap, body: &str) -> bool {
    if body.to_lowercase().contains("rate limit") {
        return true;
    }
    header_str(headers, RATE_LIMIT_REMAINING) == Some("0")
}

/// How long to wait before the next attempt.
///
/// Uses the reset timestamp when GitHub sends one (at least one second),
/// otherwise `2^attempt` seconds capped at a minute. `attempt` is 1-based.
pub fn retry_wait(headers: &HeaderMap, attempt: u32, now: i64) -> Duration {
    let reset = header_str(headers, RATE_LIMIT_RESET).and_then(|s| s.trim().parse::<i64>().ok());

    match reset {
        Some(reset_timestamp) => {
            let secs = reset_timestamp.saturating_sub(now).max(1);
            Duration::from_secs(secs as u64)
        }
        None => Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn detects_rate_limit_from_body() {
        let body = r#"{"message":"API Rate Limit exceeded for user"}"#;
        assert!(is_rate_limited(&HeaderMap::new(), body));
    }

    #[test]
    fn detects_rate_limit_from_remaining_header() {
        let h = headers(&[("x-ratelimit-remaining", "0")]);
        assert!(is_rate_limited(&h, "forbidden"));
        let h = headers(&[("x-ratelimit-remaining", "12")]);
        assert!(!is_rate_limited(&h, "forbidden"));
    }

    #[test]
    fn waits_until_reset() {
        let h = headers(&[("x-ratelimit-reset", "1000")]);
        assert_eq!(retry_wait(&h, 1, 990), Duration::from_secs(10));
    }

    #[test]
    fn reset_in_the_past_waits_one_second() {
        let h = headers(&[("x-ratelimit-reset", "1000")]);
        assert_eq!(retry_wait(&h, 3, 5000), Duration::from_secs(1));
    }

    #[test]
    fn falls_back_to_exponential_backoff() {
        let none = HeaderMap::new();
        assert_eq!(retry_wait(&none, 1, 0), Duration::from_secs(2));
        assert_eq!(retry_wait(&none, 2, 0), Duration::from_secs(4));
        assert_eq!(retry_wait(&none, 6, 0), Duration::from_secs(60));
        assert_eq!(retry_wait(&none, 40, 0), Duration::from_secs(60));

        let bad = headers(&[("x-ratelimit-reset", "soon")]);
        assert_eq!(retry_wait(&bad, 3, 0), Duration::from_secs(8));
    }
}
