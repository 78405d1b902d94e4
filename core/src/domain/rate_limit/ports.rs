use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

/// Per-client request budget
pub trait RateLimiter: Send + Sync {
    /// Counts one request for `client_id` unless it is over budget.
    fn check(&self, client_id: &str) -> RateLimitDecision;
}
