// src/ratelimit.rs
// =============================================================================
// Fixed-window rate limiting for the public contact form.
//
// How it works:
// - Each client identifier gets a counter and a window end time
// - First request (or first request after the window ended) opens a new
//   window with count = 1
// - Further requests inside the window increment the count until it reaches
//   max_requests; after that they are denied until the window ends
// - When more than `cleanup_threshold` identifiers are tracked, entries
//   whose window already ended are swept. This only happens as a side effect
//   of opening a new window, there is no background task.
//
// The map lives in this process only. Several instances behind a load
// balancer each keep their own counts.
// =============================================================================

use crate::config::RateLimitConfig;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Identifier used when a request carries no client address headers.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Source of "now" in epoch milliseconds. Tests swap in a manual clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Answer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Window end, epoch milliseconds
    pub reset_time: i64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_time: i64,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts one request for `identifier` and says whether it may proceed.
    pub async fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let max = self.config.max_requests;
        let mut windows = self.windows.lock().await;

        // Window still running
        if let Some(window) = windows
            .get_mut(identifier)
            .filter(|w| now <= w.reset_time)
        {
            if window.count >= max {
                debug!(client = %identifier, "Rate limit exceeded");
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_time: window.reset_time,
                };
            }

            window.count += 1;
            return RateLimitDecision {
                allowed: true,
                remaining: max - window.count,
                reset_time: window.reset_time,
            };
        }

        // No window yet, or it expired
        let reset_time = now.saturating_add(self.window_ms());
        windows.insert(
            identifier.to_string(),
            Window {
                count: 1,
                reset_time,
            },
        );

        if windows.len() > self.config.cleanup_threshold {
            let before = windows.len();
            windows.retain(|_, w| now <= w.reset_time);
            debug!(removed = before - windows.len(), "Swept expired rate limit windows");
        }

        RateLimitDecision {
            allowed: true,
            remaining: max.saturating_sub(1),
            reset_time,
        }
    }

    /// Whole seconds until the decision's window ends (at least 1).
    pub fn retry_after_secs(&self, decision: &RateLimitDecision) -> u64 {
        let millis = (decision.reset_time - self.clock.now_ms()).max(0) as u64;
        millis.div_ceil(1000).max(1)
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }

    // Saturates for absurdly long windows instead of wrapping
    fn window_ms(&self) -> i64 {
        i64::try_from(self.config.window().as_millis()).unwrap_or(i64::MAX)
    }
}

/// Picks the identifier a request is counted under.
///
/// First entry of `x-forwarded-for`, then `x-real-ip`, else "unknown".
/// All clients without those headers share the "unknown" quota.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    header("x-real-ip")
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn at(ms: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(ms)))
        }

        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn limiter(clock: Arc<ManualClock>) -> RateLimiter {
        RateLimiter::with_clock(RateLimitConfig::default(), clock)
    }

    #[tokio::test]
    async fn test_five_allowed_then_denied() {
        let clock = ManualClock::at(1_000);
        let limiter = limiter(clock.clone());

        let mut remaining = Vec::new();
        for _ in 0..5 {
            let decision = limiter.check("1.2.3.4").await;
            assert!(decision.allowed);
            assert_eq!(decision.reset_time, 1_000 + 3_600_000);
            remaining.push(decision.remaining);
        }
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let denied = limiter.check("1.2.3.4").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_time, 1_000 + 3_600_000);
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let clock = ManualClock::at(0);
        let limiter = limiter(clock.clone());

        for _ in 0..6 {
            limiter.check("client").await;
        }
        assert!(!limiter.check("client").await.allowed);

        // Exactly at the reset time the window is still active
        clock.advance(3_600_000);
        assert!(!limiter.check("client").await.allowed);

        clock.advance(1);
        let decision = limiter.check("client").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_time, 3_600_001 + 3_600_000);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = limiter(ManualClock::at(0));
        for _ in 0..5 {
            limiter.check("a").await;
        }
        assert!(!limiter.check("a").await.allowed);
        assert!(limiter.check("b").await.allowed);
    }

    #[tokio::test]
    async fn test_cleanup_sweeps_expired_windows_over_threshold() {
        let clock = ManualClock::at(0);
        let config = RateLimitConfig {
            cleanup_threshold: 3,
            window_secs: 10,
            ..Default::default()
        };
        let limiter = RateLimiter::with_clock(config, clock.clone());

        for id in ["a", "b", "c"] {
            limiter.check(id).await;
        }
        assert_eq!(limiter.tracked().await, 3);

        // a, b, c expire; the 4th identifier pushes the map over the threshold
        clock.advance(10_001);
        limiter.check("d").await;
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test]
    async fn test_no_cleanup_below_threshold() {
        let clock = ManualClock::at(0);
        let limiter = limiter(clock.clone());
        limiter.check("a").await;
        clock.advance(3_600_001);
        limiter.check("b").await;
        assert_eq!(limiter.tracked().await, 2);
    }

    #[tokio::test]
    async fn test_huge_window_saturates() {
        let clock = ManualClock::at(1_000);
        let config = RateLimitConfig {
            window_secs: u64::MAX,
            ..Default::default()
        };
        let limiter = RateLimiter::with_clock(config, clock.clone());

        let first = limiter.check("a").await;
        assert!(first.allowed);
        assert_eq!(first.reset_time, i64::MAX);

        // Still inside the same window, so the count keeps going
        clock.advance(10_000);
        assert_eq!(limiter.check("a").await.remaining, 3);
    }

    #[tokio::test]
    async fn test_retry_after_rounds_up() {
        let clock = ManualClock::at(0);
        let limiter = limiter(clock.clone());
        let decision = limiter.check("a").await;
        clock.advance(3_600_000 - 1_500);
        assert_eq!(limiter.retry_after_secs(&decision), 2);
    }

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 10.0.0.1 , 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_identifier(&headers), "10.0.0.1");
    }

    #[test]
    fn test_client_identifier_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_identifier(&headers), "10.0.0.9");

        assert_eq!(client_identifier(&HeaderMap::new()), UNKNOWN_CLIENT);
    }
}
