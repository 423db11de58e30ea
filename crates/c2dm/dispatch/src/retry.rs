//! Consecutive-failure circuit breakers.

use std::time::Duration;

use c2dm_core::{GatewayConfig, OutcomeCategory};

/// Failure category guarded by a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerKind {
    Timeout,
    QuotaExceeded,
}

/// Failure counters for one breaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub consecutive: u32,
    pub total: u32,
}

/// What the dispatcher should do after an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Move on to the next notification.
    Continue,
    /// Re-authenticate and resend the same notification.
    Resume,
    /// Wait, then re-authenticate and resend the same notification.
    Backoff(Duration),
    /// A breaker opened; stop dispatching.
    Abort(BreakerKind),
    /// Unrecoverable outcome; stop dispatching.
    Fatal,
}

#[derive(Debug)]
struct Breaker {
    state: RetryState,
    max_consecutive: u32,
}

impl Breaker {
    fn new(max_consecutive: u32) -> Self {
        Self {
            state: RetryState::default(),
            max_consecutive,
        }
    }

    /// Count a failure. Returns true once the breaker is open.
    fn trip(&mut self) -> bool {
        self.state.total += 1;
        self.state.consecutive += 1;
        self.state.consecutive > self.max_consecutive
    }

    fn reset(&mut self) {
        self.state.consecutive = 0;
    }
}

/// Owns the timeout and quota-exceeded breakers for one dispatch call.
#[derive(Debug)]
pub struct RetryCoordinator {
    timeout: Breaker,
    quota_exceeded: Breaker,
    quota_backoff: Duration,
}

impl RetryCoordinator {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            timeout: Breaker::new(config.max_consecutive_timeouts),
            quota_exceeded: Breaker::new(config.max_consecutive_quota_exceeded),
            quota_backoff: config.quota_backoff(),
        }
    }

    /// Feed one classified outcome and decide how to proceed.
    pub fn record(&mut self, category: OutcomeCategory) -> RetryDecision {
        match category {
            OutcomeCategory::Success | OutcomeCategory::ApplicationError => {
                self.timeout.reset();
                self.quota_exceeded.reset();
                RetryDecision::Continue
            }
            OutcomeCategory::Timeout => {
                self.quota_exceeded.reset();
                if self.timeout.trip() {
                    RetryDecision::Abort(BreakerKind::Timeout)
                } else {
                    RetryDecision::Resume
                }
            }
            OutcomeCategory::QuotaExceeded => {
                self.timeout.reset();
                if self.quota_exceeded.trip() {
                    RetryDecision::Abort(BreakerKind::QuotaExceeded)
                } else {
                    RetryDecision::Backoff(self.quota_backoff)
                }
            }
            OutcomeCategory::TransportFailure | OutcomeCategory::HttpFailure => {
                RetryDecision::Fatal
            }
        }
    }

    pub fn timeout(&self) -> RetryState {
        self.timeout.state
    }

    pub fn quota_exceeded(&self) -> RetryState {
        self.quota_exceeded.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> RetryCoordinator {
        RetryCoordinator::new(&GatewayConfig::default())
    }

    #[test]
    fn test_fifth_consecutive_timeout_opens() {
        let mut retry = coordinator();
        for _ in 0..4 {
            assert_eq!(retry.record(OutcomeCategory::Timeout), RetryDecision::Resume);
        }
        assert_eq!(
            retry.record(OutcomeCategory::Timeout),
            RetryDecision::Abort(BreakerKind::Timeout)
        );
        assert_eq!(
            retry.timeout(),
            RetryState {
                consecutive: 5,
                total: 5
            }
        );
    }

    #[test]
    fn test_success_resets_consecutive_but_not_total() {
        let mut retry = coordinator();
        for _ in 0..4 {
            retry.record(OutcomeCategory::Timeout);
        }
        assert_eq!(retry.record(OutcomeCategory::Success), RetryDecision::Continue);
        assert_eq!(retry.timeout().consecutive, 0);
        assert_eq!(retry.timeout().total, 4);

        // Another four in a row are allowed again
        for _ in 0..4 {
            assert_eq!(retry.record(OutcomeCategory::Timeout), RetryDecision::Resume);
        }
    }

    #[test]
    fn test_quota_backs_off_then_opens() {
        let mut retry = coordinator();
        for _ in 0..4 {
            assert_eq!(
                retry.record(OutcomeCategory::QuotaExceeded),
                RetryDecision::Backoff(Duration::from_secs(5))
            );
        }
        assert_eq!(
            retry.record(OutcomeCategory::QuotaExceeded),
            RetryDecision::Abort(BreakerKind::QuotaExceeded)
        );
    }

    #[test]
    fn test_breakers_reset_each_other() {
        let mut retry = coordinator();
        retry.record(OutcomeCategory::Timeout);
        retry.record(OutcomeCategory::QuotaExceeded);
        assert_eq!(retry.timeout().consecutive, 0);
        assert_eq!(retry.quota_exceeded().consecutive, 1);

        retry.record(OutcomeCategory::ApplicationError);
        assert_eq!(retry.quota_exceeded().consecutive, 0);
        assert_eq!(retry.quota_exceeded().total, 1);
    }

    #[test]
    fn test_transport_and_http_failures_are_fatal() {
        let mut retry = coordinator();
        assert_eq!(
            retry.record(OutcomeCategory::TransportFailure),
            RetryDecision::Fatal
        );
        assert_eq!(retry.record(OutcomeCategory::HttpFailure), RetryDecision::Fatal);
    }
}
