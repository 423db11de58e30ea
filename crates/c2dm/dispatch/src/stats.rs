//! Result accumulation.

use std::time::Duration;

use c2dm_core::{
    BatchResult, Counts, DispatchOutcome, ExceptionKind, ExceptionRecord, OutcomeCategory,
    RetryRounds, Timing,
};

use crate::RetryState;

/// Exception log kind for a failing category.
pub fn exception_kind(category: OutcomeCategory) -> Option<ExceptionKind> {
    match category {
        OutcomeCategory::Success | OutcomeCategory::ApplicationError => None,
        OutcomeCategory::QuotaExceeded => Some(ExceptionKind::QuotaExceeded),
        OutcomeCategory::Timeout => Some(ExceptionKind::Timeout),
        OutcomeCategory::TransportFailure => Some(ExceptionKind::TransportFailure),
        OutcomeCategory::HttpFailure => Some(ExceptionKind::HttpFailure),
    }
}

/// Builds a [`BatchResult`] incrementally over one dispatch call.
#[derive(Debug)]
pub struct StatsAggregator {
    outcomes: Vec<DispatchOutcome>,
    timeouts: Vec<DispatchOutcome>,
    quota_exceeded: Vec<DispatchOutcome>,
    exceptions: Vec<ExceptionRecord>,
    counts: Counts,
    total_time: Duration,
    samples: u64,
    halted: bool,
}

impl StatsAggregator {
    /// Start aggregating for a batch of `total` notifications.
    pub fn new(total: usize) -> Self {
        Self {
            outcomes: Vec::new(),
            timeouts: Vec::new(),
            quota_exceeded: Vec::new(),
            exceptions: Vec::new(),
            counts: Counts {
                total,
                ..Counts::default()
            },
            total_time: Duration::ZERO,
            samples: 0,
            halted: false,
        }
    }

    pub fn record_timing(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.samples += 1;
    }

    /// File an outcome under its category and bump the matching counter.
    pub fn record(&mut self, outcome: DispatchOutcome) {
        match outcome.category {
            OutcomeCategory::Success => self.counts.success += 1,
            OutcomeCategory::ApplicationError | OutcomeCategory::HttpFailure => {
                self.counts.error += 1;
                self.outcomes.push(outcome);
            }
            OutcomeCategory::TransportFailure => {
                self.counts.exception += 1;
                self.outcomes.push(outcome);
            }
            OutcomeCategory::Timeout => {
                self.counts.timeout_total += 1;
                self.timeouts.push(outcome);
            }
            OutcomeCategory::QuotaExceeded => {
                self.counts.quota_exceeded_total += 1;
                self.quota_exceeded.push(outcome);
            }
        }
    }

    pub fn record_exception(&mut self, kind: ExceptionKind, message: impl Into<String>) {
        self.exceptions.push(ExceptionRecord {
            kind,
            message: message.into(),
        });
    }

    /// Forget the failures collected for a category before it is replayed.
    /// Totals already counted are kept.
    pub fn clear_category(&mut self, category: OutcomeCategory) {
        match category {
            OutcomeCategory::Timeout => self.timeouts.clear(),
            OutcomeCategory::QuotaExceeded => self.quota_exceeded.clear(),
            _ => {}
        }
    }

    pub fn set_consecutive(&mut self, timeout: RetryState, quota_exceeded: RetryState) {
        self.counts.timeout_consecutive = timeout.consecutive as usize;
        self.counts.quota_exceeded_consecutive = quota_exceeded.consecutive as usize;
    }

    pub fn set_retry_rounds(&mut self, rounds: RetryRounds) {
        self.counts.retry_rounds = rounds;
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn average(&self) -> Duration {
        if self.samples == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_time.as_nanos() / u128::from(self.samples);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    pub fn finish(self) -> BatchResult {
        let timing = Timing {
            total: self.total_time,
            samples: self.samples,
            average: self.average(),
        };
        let mut counts = self.counts;
        counts.failure = counts.total.saturating_sub(counts.success);

        tracing::info!(
            total = counts.total,
            success = counts.success,
            failure = counts.failure,
            error = counts.error,
            exception = counts.exception,
            timeouts = counts.timeout_total,
            quota_exceeded = counts.quota_exceeded_total,
            average_ms = u64::try_from(timing.average.as_millis()).unwrap_or(u64::MAX),
            halted = self.halted,
            "dispatch finished"
        );

        BatchResult {
            outcomes: self.outcomes,
            timeouts: self.timeouts,
            quota_exceeded: self.quota_exceeded,
            counts,
            exceptions: self.exceptions,
            timing,
            halted: self.halted,
        }
    }
}
