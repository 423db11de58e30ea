//! C2DM Dispatch
//!
//! Batch delivery of push notifications: retry coordination, sequential and
//! concurrent dispatch strategies, and result aggregation.

mod concurrent;
mod retry;
mod sequential;
mod stats;
#[cfg(test)]
mod testing;

pub use concurrent::ConcurrentDispatcher;
pub use retry::*;
pub use sequential::SequentialDispatcher;
pub use stats::*;

use c2dm_core::{BatchResult, Credentials, DispatchOutcome, GatewayConfig, NotificationRequest};
use c2dm_gateway::{AuthenticationError, Transport};

// Re-export for convenience
pub use c2dm_core;
pub use c2dm_gateway;

/// Authenticate and send a single notification.
///
/// The reply is classified but never retried. To send several notifications
/// on one session, keep a [`SequentialDispatcher`] and call
/// [`SequentialDispatcher::send`].
pub async fn send_notification<T: Transport>(
    transport: &T,
    config: &GatewayConfig,
    credentials: &Credentials,
    notification: &NotificationRequest,
) -> Result<DispatchOutcome, AuthenticationError> {
    let dispatcher = SequentialDispatcher::connect(transport, config, credentials).await?;
    Ok(dispatcher.send(notification).await)
}

/// Authenticate and send `notifications` one at a time, in order.
///
/// Only the initial authentication failure is returned as an error; every
/// later failure ends up in the returned [`BatchResult`].
pub async fn send_batch_sequential<T: Transport>(
    transport: &T,
    config: &GatewayConfig,
    credentials: &Credentials,
    notifications: &[NotificationRequest],
) -> Result<BatchResult, AuthenticationError> {
    let dispatcher = SequentialDispatcher::connect(transport, config, credentials).await?;
    Ok(dispatcher.dispatch(notifications).await)
}

/// Authenticate and send `notifications` concurrently with retry rounds.
pub async fn send_batch_concurrent<T: Transport>(
    transport: &T,
    config: &GatewayConfig,
    credentials: &Credentials,
    notifications: Vec<NotificationRequest>,
) -> Result<BatchResult, AuthenticationError> {
    let dispatcher = ConcurrentDispatcher::connect(transport, config, credentials).await?;
    Ok(dispatcher.dispatch(notifications).await)
}
