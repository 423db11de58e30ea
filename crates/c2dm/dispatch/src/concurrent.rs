//! Bounded-concurrency dispatcher with round-based retries.

use std::collections::HashMap;
use std::time::Duration;

use c2dm_core::{
    BatchResult, Credentials, DispatchOutcome, ExceptionKind, GatewayConfig, NotificationRequest,
    OutcomeCategory, RetryRounds, SessionToken,
};
use c2dm_gateway::{
    AuthenticationError, FormPost, RawResponse, Transport, authenticate, classify, push_request,
};
use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use tokio::time::Instant;

use crate::StatsAggregator;

/// Identifies one in-flight request within a round.
type RequestId = u64;

struct Completion {
    id: RequestId,
    response: RawResponse,
    elapsed: Duration,
}

/// Notifications waiting for a replay round.
#[derive(Default)]
struct RetryQueues {
    quota_exceeded: Vec<NotificationRequest>,
    timeout: Vec<NotificationRequest>,
}

impl RetryQueues {
    fn get_mut(&mut self, category: OutcomeCategory) -> Option<&mut Vec<NotificationRequest>> {
        match category {
            OutcomeCategory::QuotaExceeded => Some(&mut self.quota_exceeded),
            OutcomeCategory::Timeout => Some(&mut self.timeout),
            _ => None,
        }
    }
}

/// Sends a batch with at most `max_concurrency` requests in flight, then
/// replays quota-exceeded and timed-out notifications in further rounds.
///
/// Each round completes fully before the next one starts. Outcomes are
/// recorded in completion order, so callers correlate on registration id.
///
/// `quota_exceeded_total` and `timeout_total` count failures per round: a
/// notification rejected in round 0 and again in round 1 is counted twice.
pub struct ConcurrentDispatcher<'a, T> {
    transport: &'a T,
    config: &'a GatewayConfig,
    token: SessionToken,
}

impl<'a, T: Transport> ConcurrentDispatcher<'a, T> {
    /// Authenticate and create a dispatcher holding the new session.
    pub async fn connect(
        transport: &'a T,
        config: &'a GatewayConfig,
        credentials: &Credentials,
    ) -> Result<Self, AuthenticationError> {
        let token = authenticate(transport, config, credentials).await?;

        Ok(Self {
            transport,
            config,
            token,
        })
    }

    /// Send the whole batch. Consumes the session.
    #[tracing::instrument(skip_all, fields(notifications = notifications.len()))]
    pub async fn dispatch(self, notifications: Vec<NotificationRequest>) -> BatchResult {
        let mut stats = StatsAggregator::new(notifications.len());
        let mut queues = RetryQueues::default();

        tracing::info!(
            count = notifications.len(),
            max_concurrency = self.config.concurrency(),
            "sending notifications"
        );
        self.run_round(notifications, &mut queues, &mut stats).await;

        let rounds = RetryRounds {
            quota_exceeded: self
                .replay(OutcomeCategory::QuotaExceeded, &mut queues, &mut stats)
                .await,
            timeout: self
                .replay(OutcomeCategory::Timeout, &mut queues, &mut stats)
                .await,
        };
        stats.set_retry_rounds(rounds);

        stats.finish()
    }

    /// Replay a category's queue until it drains or the round limit is hit.
    /// Returns the number of rounds run.
    async fn replay(
        &self,
        category: OutcomeCategory,
        queues: &mut RetryQueues,
        stats: &mut StatsAggregator,
    ) -> u32 {
        let mut rounds = 0;

        while rounds < self.config.max_retry_rounds {
            let batch = match queues.get_mut(category) {
                Some(queue) if !queue.is_empty() => std::mem::take(queue),
                _ => break,
            };
            rounds += 1;
            stats.clear_category(category);

            tracing::info!(
                ?category,
                round = rounds,
                count = batch.len(),
                "retrying notifications"
            );
            self.run_round(batch, queues, stats).await;
        }

        rounds
    }

    /// Send one round and wait for every request in it to complete.
    async fn run_round(
        &self,
        batch: Vec<NotificationRequest>,
        queues: &mut RetryQueues,
        stats: &mut StatsAggregator,
    ) {
        let max_concurrency = self.config.concurrency();
        let mut pending = batch.into_iter();
        let mut in_flight: HashMap<RequestId, NotificationRequest> = HashMap::new();
        let mut completions = FuturesUnordered::new();
        let mut next_id: RequestId = 0;

        loop {
            while completions.len() < max_concurrency {
                let Some(notification) = pending.next() else {
                    break;
                };
                let id = next_id;
                next_id += 1;

                let request = push_request(self.config, &self.token, &notification);
                completions.push(self.send(id, request));
                in_flight.insert(id, notification);
            }

            let Some(completion) = completions.next().await else {
                break;
            };
            let Some(notification) = in_flight.remove(&completion.id) else {
                tracing::error!(id = completion.id, "completion for unknown request");
                continue;
            };

            stats.record_timing(completion.elapsed);
            self.complete(notification, &completion.response, queues, stats);
        }
    }

    async fn send(&self, id: RequestId, request: FormPost) -> Completion {
        let started = Instant::now();
        let response = self.transport.post(&request).await;

        Completion {
            id,
            response,
            elapsed: started.elapsed(),
        }
    }

    fn complete(
        &self,
        notification: NotificationRequest,
        response: &RawResponse,
        queues: &mut RetryQueues,
        stats: &mut StatsAggregator,
    ) {
        let classification = classify(response);
        let category = classification.category;
        let registration_id = notification.registration_id();

        match category {
            OutcomeCategory::QuotaExceeded => {
                tracing::warn!(registration_id, "quota exceeded, queued for retry");
            }
            OutcomeCategory::Timeout => {
                tracing::warn!(
                    registration_id,
                    error = %classification.description,
                    "timeout, queued for retry"
                );
            }
            OutcomeCategory::TransportFailure => {
                tracing::warn!(
                    registration_id,
                    error = %classification.description,
                    "could not get an HTTP response"
                );
                stats.record_exception(
                    ExceptionKind::TransportFailure,
                    classification.description.clone(),
                );
            }
            OutcomeCategory::HttpFailure => {
                tracing::warn!(
                    registration_id,
                    status = classification.http_status_code,
                    body = %classification.description,
                    "HTTP request failed"
                );
            }
            OutcomeCategory::Success | OutcomeCategory::ApplicationError => {
                tracing::debug!(
                    registration_id,
                    ?category,
                    description = %classification.description,
                    "notification completed"
                );
            }
        }

        stats.record(DispatchOutcome::new(
            &notification,
            category,
            classification.description,
            classification.http_status_code,
        ));
        if let Some(queue) = queues.get_mut(category) {
            queue.push(notification);
        }
    }
}
