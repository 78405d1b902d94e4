use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::{
    common::RateLimitConfig,
    rate_limit::ports::{RateLimitDecision, RateLimiter},
};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
/// Table size above which expired clients are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    fn roll(&mut self, now: Instant, period: Duration) {
        if now.duration_since(self.started) >= period {
            *self = Window::new(now);
        }
    }

    fn retry_after(&self, now: Instant, period: Duration) -> Duration {
        period.saturating_sub(now.duration_since(self.started))
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientWindows {
    minute: Window,
    hour: Window,
}

/// Fixed-window limiter keyed by client id. A limit of 0 disables that
/// window.
pub struct InMemoryRateLimiter {
    per_minute: u32,
    per_hour: u32,
    clients: DashMap<String, ClientWindows>,
}

impl InMemoryRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            per_minute: config.per_minute,
            per_hour: config.per_hour,
            clients: DashMap::new(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.per_minute == 0 && self.per_hour == 0
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        if self.is_disabled() {
            return RateLimitDecision::Allowed;
        }
        if self.clients.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }

        // The entry guard holds the shard lock, so the check and the
        // increment are atomic per client.
        let mut entry = self
            .clients
            .entry(client_id.to_string())
            .or_insert_with(|| ClientWindows {
                minute: Window::new(now),
                hour: Window::new(now),
            });
        let windows = entry.value_mut();
        windows.minute.roll(now, MINUTE);
        windows.hour.roll(now, HOUR);

        let mut retry_after = Duration::ZERO;
        if self.per_minute > 0 && windows.minute.count >= self.per_minute {
            retry_after = retry_after.max(windows.minute.retry_after(now, MINUTE));
        }
        if self.per_hour > 0 && windows.hour.count >= self.per_hour {
            retry_after = retry_after.max(windows.hour.retry_after(now, HOUR));
        }
        if !retry_after.is_zero() {
            return RateLimitDecision::Limited { retry_after };
        }

        windows.minute.count += 1;
        windows.hour.count += 1;
        RateLimitDecision::Allowed
    }

    fn prune(&self, now: Instant) {
        self.clients
            .retain(|_, windows| now.duration_since(windows.hour.started) < HOUR);
        tracing::debug!(remaining = self.clients.len(), "Pruned rate limit table");
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, client_id: &str) -> RateLimitDecision {
        self.check_at(client_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: u32, per_hour: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(&RateLimitConfig {
            per_minute,
            per_hour,
        })
    }

    #[test]
    fn test_limits_after_budget() {
        let limiter = limiter(2, 100);
        let now = Instant::now();

        assert!(limiter.check_at("1.2.3.4", now).is_allowed());
        assert!(limiter.check_at("1.2.3.4", now).is_allowed());
        assert_eq!(
            limiter.check_at("1.2.3.4", now + Duration::from_secs(15)),
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(45)
            }
        );
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 100);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("b", now).is_allowed());
        assert!(!limiter.check_at("a", now).is_allowed());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_minute_window_resets() {
        let limiter = limiter(1, 100);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(!limiter.check_at("a", now + Duration::from_secs(30)).is_allowed());
        assert!(limiter.check_at("a", now + MINUTE).is_allowed());
    }

    #[test]
    fn test_hour_window_applies() {
        let limiter = limiter(0, 2);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("a", now + Duration::from_secs(120)).is_allowed());
        assert_eq!(
            limiter.check_at("a", now + Duration::from_secs(600)),
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(3000)
            }
        );
    }

    #[test]
    fn test_limited_requests_are_not_counted() {
        let limiter = limiter(1, 2);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        for _ in 0..5 {
            assert!(!limiter.check_at("a", now).is_allowed());
        }
        // Only one request counted against the hour, so the next minute
        // still has room.
        assert!(limiter.check_at("a", now + MINUTE).is_allowed());
    }

    #[test]
    fn test_zero_disables() {
        let limiter = limiter(0, 0);
        let now = Instant::now();
        for _ in 0..50 {
            assert!(limiter.check_at("a", now).is_allowed());
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
