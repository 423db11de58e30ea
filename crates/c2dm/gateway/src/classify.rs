//! Gateway response classification.

use c2dm_core::OutcomeCategory;

use crate::RawResponse;

/// Marker the gateway puts in front of error descriptions.
pub const ERROR_MARKER: &str = "Error=";

/// Description the gateway uses to signal rate limiting.
pub const QUOTA_EXCEEDED: &str = "QuotaExceeded";

/// Category plus details extracted from a raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: OutcomeCategory,
    pub description: String,
    pub http_status_code: Option<u16>,
}

/// Map a raw transport response to an outcome category.
pub fn classify(response: &RawResponse) -> Classification {
    match response {
        RawResponse::Timeout { message } => Classification {
            category: OutcomeCategory::Timeout,
            description: message.clone(),
            http_status_code: None,
        },
        RawResponse::NoResponse { message } => Classification {
            category: OutcomeCategory::TransportFailure,
            description: message.clone(),
            http_status_code: None,
        },
        RawResponse::Http { status, body } if !(200..300).contains(status) => Classification {
            category: OutcomeCategory::HttpFailure,
            description: body.replace(ERROR_MARKER, ""),
            http_status_code: Some(*status),
        },
        RawResponse::Http { status, body } => classify_body(*status, body),
    }
}

fn classify_body(status: u16, body: &str) -> Classification {
    let Some((_, description)) = body.split_once(ERROR_MARKER) else {
        return Classification {
            category: OutcomeCategory::Success,
            description: body.to_string(),
            http_status_code: Some(status),
        };
    };

    let description = description.trim();
    let category = if description == QUOTA_EXCEEDED {
        OutcomeCategory::QuotaExceeded
    } else {
        OutcomeCategory::ApplicationError
    };

    Classification {
        category,
        description: description.to_string(),
        http_status_code: Some(status),
    }
}
