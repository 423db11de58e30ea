//! Dispatch outcome types.

use crate::NotificationRequest;

/// Category a gateway response is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OutcomeCategory {
    /// Message accepted by the gateway.
    Success,
    /// 2xx response carrying an `Error=` description other than quota.
    ApplicationError,
    /// Gateway rate-limit signal (`Error=QuotaExceeded`).
    QuotaExceeded,
    /// Transport read timeout.
    Timeout,
    /// No HTTP response obtained at all.
    TransportFailure,
    /// Non-2xx HTTP status.
    HttpFailure,
}

impl OutcomeCategory {
    pub fn is_error(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Result of sending one notification.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DispatchOutcome {
    pub category: OutcomeCategory,
    pub description: String,
    pub http_status_code: Option<u16>,
    pub registration_id: String,
    pub key_value_pairs: Vec<(String, String)>,
}

impl DispatchOutcome {
    /// Build an outcome record for the notification that produced it.
    pub fn new(
        notification: &NotificationRequest,
        category: OutcomeCategory,
        description: impl Into<String>,
        http_status_code: Option<u16>,
    ) -> Self {
        Self {
            category,
            description: description.into(),
            http_status_code,
            registration_id: notification.registration_id().to_owned(),
            key_value_pairs: notification.key_value_pairs().to_vec(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category.is_error()
    }
}
