//! Resumable one-at-a-time dispatcher.

use std::time::Duration;

use c2dm_core::{
    BatchResult, Credentials, DispatchOutcome, ExceptionKind, GatewayConfig, NotificationRequest,
    SessionToken,
};
use c2dm_gateway::{AuthenticationError, Transport, authenticate, classify, push_request};
use tokio::time::Instant;

use crate::{BreakerKind, RetryCoordinator, RetryDecision, StatsAggregator, exception_kind};

/// Session state of a sequential dispatch. A dispatcher starts out idle and
/// becomes `Sending` once [`SequentialDispatcher::connect`] has a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Authenticating,
    Sending,
    Done,
    CircuitOpen,
}

/// Sends notifications one at a time, re-authenticating and resuming from
/// the failed notification after a timeout or quota rejection.
///
/// Delivery is at-least-once: a notification that times out may already have
/// been accepted by the gateway and is sent again.
pub struct SequentialDispatcher<'a, T> {
    transport: &'a T,
    config: &'a GatewayConfig,
    credentials: &'a Credentials,
    token: SessionToken,
}

impl<'a, T: Transport> SequentialDispatcher<'a, T> {
    /// Authenticate and create a dispatcher holding the new session.
    pub async fn connect(
        transport: &'a T,
        config: &'a GatewayConfig,
        credentials: &'a Credentials,
    ) -> Result<Self, AuthenticationError> {
        let token = authenticate(transport, config, credentials).await?;

        Ok(Self {
            transport,
            config,
            credentials,
            token,
        })
    }

    /// Send every notification in order. Consumes the session.
    #[tracing::instrument(skip_all, fields(notifications = notifications.len()))]
    pub async fn dispatch(self, notifications: &[NotificationRequest]) -> BatchResult {
        let mut stats = StatsAggregator::new(notifications.len());
        let mut retry = RetryCoordinator::new(self.config);
        let mut token = self.token.clone();
        let mut cursor = 0;
        let mut state = SessionState::Sending;

        while !matches!(state, SessionState::Done | SessionState::CircuitOpen) {
            state = match state {
                SessionState::Authenticating => {
                    match authenticate(self.transport, self.config, self.credentials).await {
                        Ok(fresh) => {
                            token = fresh;
                            SessionState::Sending
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                cursor,
                                "re-authentication failed, giving up"
                            );
                            stats.record_exception(ExceptionKind::Authentication, e.to_string());
                            SessionState::CircuitOpen
                        }
                    }
                }
                SessionState::Sending => match notifications.get(cursor) {
                    None => {
                        tracing::debug!("reached the end of the notification list");
                        SessionState::Done
                    }
                    Some(notification) => {
                        let decision = self
                            .step(&token, notification, cursor, &mut retry, &mut stats)
                            .await;

                        match decision {
                            RetryDecision::Continue => {
                                cursor += 1;
                                SessionState::Sending
                            }
                            RetryDecision::Resume => SessionState::Authenticating,
                            RetryDecision::Backoff(delay) => {
                                tokio::time::sleep(delay).await;
                                SessionState::Authenticating
                            }
                            RetryDecision::Abort(_) | RetryDecision::Fatal => {
                                SessionState::CircuitOpen
                            }
                        }
                    }
                },
                SessionState::Done | SessionState::CircuitOpen => state,
            };
        }

        if state == SessionState::CircuitOpen {
            stats.halt();
        }
        stats.set_consecutive(retry.timeout(), retry.quota_exceeded());
        stats.finish()
    }

    /// Send a single notification on the current session and classify the
    /// gateway's reply.
    ///
    /// Nothing is retried: a timeout or quota rejection comes back as the
    /// outcome's category and the caller decides what to do with it.
    pub async fn send(&self, notification: &NotificationRequest) -> DispatchOutcome {
        let (outcome, _) = send_one(self.transport, self.config, &self.token, notification).await;
        tracing::debug!(
            registration_id = notification.registration_id(),
            category = ?outcome.category,
            "notification sent"
        );
        outcome
    }

    async fn step(
        &self,
        token: &SessionToken,
        notification: &NotificationRequest,
        cursor: usize,
        retry: &mut RetryCoordinator,
        stats: &mut StatsAggregator,
    ) -> RetryDecision {
        let registration_id = notification.registration_id();
        tracing::debug!(cursor, registration_id, "sending notification");

        let (outcome, elapsed) = send_one(self.transport, self.config, token, notification).await;
        stats.record_timing(elapsed);

        let category = outcome.category;
        let decision = retry.record(category);

        if let Some(kind) = exception_kind(category) {
            stats.record_exception(kind, outcome.description.clone());
        }
        match decision {
            RetryDecision::Continue => {}
            RetryDecision::Resume => {
                let state = retry.timeout();
                tracing::warn!(
                    cursor,
                    registration_id,
                    consecutive = state.consecutive,
                    "timeout, resuming with a new session"
                );
            }
            RetryDecision::Backoff(delay) => {
                let state = retry.quota_exceeded();
                tracing::warn!(
                    cursor,
                    registration_id,
                    consecutive = state.consecutive,
                    delay_secs = delay.as_secs(),
                    "quota exceeded, backing off"
                );
            }
            RetryDecision::Abort(kind) => {
                let state = match kind {
                    BreakerKind::Timeout => retry.timeout(),
                    BreakerKind::QuotaExceeded => retry.quota_exceeded(),
                };
                tracing::error!(
                    cursor,
                    registration_id,
                    breaker = ?kind,
                    consecutive = state.consecutive,
                    "too many consecutive failures, giving up"
                );
            }
            RetryDecision::Fatal => {
                tracing::error!(
                    cursor,
                    registration_id,
                    ?category,
                    description = %outcome.description,
                    "unrecoverable failure, giving up"
                );
            }
        }

        stats.record(outcome);
        decision
    }
}

/// Post one notification with `token` and classify the response. Returns the
/// outcome together with the request's round-trip time.
async fn send_one<T: Transport>(
    transport: &T,
    config: &GatewayConfig,
    token: &SessionToken,
    notification: &NotificationRequest,
) -> (DispatchOutcome, Duration) {
    let request = push_request(config, token, notification);
    let started = Instant::now();
    let response = transport.post(&request).await;
    let elapsed = started.elapsed();

    let classification = classify(&response);
    let outcome = DispatchOutcome::new(
        notification,
        classification.category,
        classification.description,
        classification.http_status_code,
    );
    (outcome, elapsed)
}
