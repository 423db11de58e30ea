//! Batch result types.

use std::time::Duration;

use crate::DispatchOutcome;

/// Kind of failure recorded in the exception log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ExceptionKind {
    Timeout,
    QuotaExceeded,
    TransportFailure,
    HttpFailure,
    Authentication,
}

/// One entry of the exception log.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExceptionRecord {
    pub kind: ExceptionKind,
    pub message: String,
}

/// Number of replay rounds run per retried category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RetryRounds {
    pub quota_exceeded: u32,
    pub timeout: u32,
}

/// Counters for a finished batch.
///
/// `quota_exceeded_total` and `timeout_total` count occurrences, not
/// notifications: a notification failing the same way in several retry
/// rounds is counted once per round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Counts {
    pub success: usize,
    /// Gateway rejections: application errors and non-2xx responses.
    pub error: usize,
    /// Unknown errors: requests that never got an HTTP response. Their
    /// outcomes sit in [`BatchResult::outcomes`] as `TransportFailure`.
    pub exception: usize,
    pub timeout_total: usize,
    pub timeout_consecutive: usize,
    pub quota_exceeded_total: usize,
    pub quota_exceeded_consecutive: usize,
    /// Notifications submitted.
    pub total: usize,
    /// `total - success`.
    pub failure: usize,
    pub retry_rounds: RetryRounds,
}

/// Request timing across every completed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Timing {
    pub total: Duration,
    pub samples: u64,
    pub average: Duration,
}

/// Final result of a dispatch call. Built once, never mutated after return.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BatchResult {
    /// Final non-success outcomes other than timeouts and quota rejections,
    /// in completion order. Includes transport failures.
    pub outcomes: Vec<DispatchOutcome>,
    pub timeouts: Vec<DispatchOutcome>,
    pub quota_exceeded: Vec<DispatchOutcome>,
    pub counts: Counts,
    pub exceptions: Vec<ExceptionRecord>,
    pub timing: Timing,
    /// Dispatch stopped before every notification was handled.
    pub halted: bool,
}

impl BatchResult {
    /// Check if every submitted notification was accepted.
    pub fn is_complete_success(&self) -> bool {
        !self.halted && self.counts.success == self.counts.total
    }
}
