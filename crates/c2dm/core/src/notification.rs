//! Notification request types.

/// Error building a [`NotificationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidNotification {
    #[error("registration id must not be empty")]
    EmptyRegistrationId,
}

/// A single addressed push message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NotificationRequest {
    registration_id: String,
    key_value_pairs: Vec<(String, String)>,
}

impl NotificationRequest {
    /// Create a notification for a device registration id with no payload.
    pub fn new(registration_id: impl Into<String>) -> Result<Self, InvalidNotification> {
        let registration_id = registration_id.into();
        if registration_id.trim().is_empty() {
            return Err(InvalidNotification::EmptyRegistrationId);
        }

        Ok(Self {
            registration_id,
            key_value_pairs: Vec::new(),
        })
    }

    /// Append a payload entry. Entries are sent in insertion order.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_value_pairs.push((key.into(), value.into()));
        self
    }

    /// Device registration id.
    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    /// Payload entries in insertion order.
    pub fn key_value_pairs(&self) -> &[(String, String)] {
        &self.key_value_pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_registration_id() {
        assert_eq!(
            NotificationRequest::new("  "),
            Err(InvalidNotification::EmptyRegistrationId)
        );
    }

    #[test]
    fn test_payload_keeps_insertion_order() {
        let request = NotificationRequest::new("device-1")
            .unwrap()
            .with_data("zeta", "1")
            .with_data("alpha", "2");

        let keys: Vec<&str> = request
            .key_value_pairs()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }
}
