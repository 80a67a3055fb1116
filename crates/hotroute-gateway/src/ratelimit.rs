// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-plugin, per-client sliding-window rate limiting.
//!
//! Each `(client, plugin)` pair keeps the timestamps of its accepted requests
//! inside the trailing window. Expired timestamps are pruned lazily on the
//! next check for that key.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderMap;
use dashmap::DashMap;
use hotroute_plugin::RateLimitSpec;
use tokio::time::Instant;

/// Client identity used when neither the peer address nor a proxy header is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request accepted; `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// Request rejected; the oldest counted request leaves the window in
    /// `retry_after_secs` (at least 1).
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Sliding-window limiter shared by every plugin guard.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<(String, String), VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record one request from `client` against `plugin`'s limit.
    ///
    /// A denied request is not recorded.
    pub fn check(&self, client: &str, plugin: &str, spec: &RateLimitSpec) -> RateLimitDecision {
        let now = Instant::now();
        let window = Duration::from_millis(spec.window_ms);

        let mut timestamps = self
            .windows
            .entry((client.to_string(), plugin.to_string()))
            .or_default();

        while timestamps
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() >= spec.limit as usize {
            let elapsed = timestamps
                .front()
                .map(|oldest| now.duration_since(*oldest))
                .unwrap_or_default();
            let remaining_ms = window.saturating_sub(elapsed).as_millis() as u64;
            return RateLimitDecision::Limited {
                retry_after_secs: remaining_ms.div_ceil(1000).max(1),
            };
        }

        timestamps.push_back(now);
        RateLimitDecision::Allowed {
            remaining: spec.limit.saturating_sub(timestamps.len() as u32),
        }
    }

    /// Number of tracked `(client, plugin)` windows.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Derive the client identity for rate limiting.
///
/// With `trust_proxy_headers`, the leftmost `X-Forwarded-For` entry wins;
/// otherwise the peer address is used, then [`UNKNOWN_CLIENT`].
pub fn client_identity(
    remote_addr: Option<SocketAddr>,
    headers: &HeaderMap,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn spec(limit: u32, window_ms: u64) -> RateLimitSpec {
        RateLimitSpec { limit, window_ms }
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_request_in_window_is_limited() {
        let limiter = RateLimiter::new();
        let limit = spec(3, 1000);

        for expected_remaining in [2, 1, 0] {
            assert_eq!(
                limiter.check("1.2.3.4", "ping", &limit),
                RateLimitDecision::Allowed {
                    remaining: expected_remaining
                }
            );
        }
        assert_eq!(
            limiter.check("1.2.3.4", "ping", &limit),
            RateLimitDecision::Limited { retry_after_secs: 1 }
        );

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(limiter.check("1.2.3.4", "ping", &limit).is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_rounds_up_remaining_window() {
        let limiter = RateLimiter::new();
        let limit = spec(1, 5000);
        assert!(limiter.check("c", "p", &limit).is_allowed());

        tokio::time::advance(Duration::from_millis(1200)).await;
        assert_eq!(
            limiter.check("c", "p", &limit),
            RateLimitDecision::Limited { retry_after_secs: 4 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn denied_requests_are_not_recorded() {
        let limiter = RateLimiter::new();
        let limit = spec(1, 1000);
        assert!(limiter.check("c", "p", &limit).is_allowed());

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!limiter.check("c", "p", &limit).is_allowed());

        // Only the first request counts, so the window frees up 1000 ms after it.
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(limiter.check("c", "p", &limit).is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn windows_are_keyed_by_client_and_plugin() {
        let limiter = RateLimiter::new();
        let limit = spec(1, 1000);
        assert!(limiter.check("a", "ping", &limit).is_allowed());
        assert!(limiter.check("b", "ping", &limit).is_allowed());
        assert!(limiter.check("a", "pong", &limit).is_allowed());
        assert!(!limiter.check("a", "ping", &limit).is_allowed());
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn client_identity_prefers_peer_address() {
        let addr: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));

        assert_eq!(client_identity(Some(addr), &headers, false), "10.0.0.7");
        assert_eq!(client_identity(None, &HeaderMap::new(), false), UNKNOWN_CLIENT);
    }

    #[test]
    fn client_identity_trusts_leftmost_forwarded_entry() {
        let addr: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_identity(Some(addr), &headers, true), "203.0.113.9");

        let mut blank = HeaderMap::new();
        blank.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(client_identity(Some(addr), &blank, true), "10.0.0.7");
    }

    proptest! {
        #[test]
        fn never_allows_more_than_limit_in_one_instant(limit in 1u32..20, attempts in 1usize..60) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();
            rt.block_on(async {
                let limiter = RateLimiter::new();
                let spec = spec(limit, 1000);
                let allowed = (0..attempts)
                    .filter(|_| limiter.check("c", "p", &spec).is_allowed())
                    .count();
                prop_assert_eq!(allowed, attempts.min(limit as usize));
                Ok(())
            })?;
        }
    }
}
