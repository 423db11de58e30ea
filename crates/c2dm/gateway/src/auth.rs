//! ClientLogin session authentication.

use c2dm_core::{Credentials, GatewayConfig, SessionToken};
use thiserror::Error;

use crate::{RawResponse, Transport, auth_request};

const TOKEN_LINE: usize = 2;
const TOKEN_PREFIX: &str = "Auth=";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("auth request timed out: {0}")]
    Timeout(String),
    #[error("auth request failed: {0}")]
    Transport(String),
    #[error("auth endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),
}

/// Exchange credentials for a session token with one POST to the auth
/// endpoint.
pub async fn authenticate<T: Transport>(
    transport: &T,
    config: &GatewayConfig,
    credentials: &Credentials,
) -> Result<SessionToken, AuthenticationError> {
    tracing::debug!(
        username = %credentials.username,
        source = %credentials.source,
        "requesting auth token"
    );

    let request = auth_request(config, credentials);
    let body = match transport.post(&request).await {
        RawResponse::Http { status, body } if (200..300).contains(&status) => body,
        RawResponse::Http { status, body } => {
            return Err(AuthenticationError::Rejected { status, body });
        }
        RawResponse::Timeout { message } => return Err(AuthenticationError::Timeout(message)),
        RawResponse::NoResponse { message } => {
            return Err(AuthenticationError::Transport(message));
        }
    };

    let token = extract_token(&body)?;
    tracing::info!(username = %credentials.username, "received auth token");
    Ok(token)
}

/// Pull the token out of a ClientLogin response body.
///
/// The body is `SID=..\nLSID=..\nAuth=..`; the token is always the third
/// line with its `Auth=` prefix removed.
pub fn extract_token(body: &str) -> Result<SessionToken, AuthenticationError> {
    let line = body.split('\n').nth(TOKEN_LINE).ok_or_else(|| {
        AuthenticationError::MalformedResponse(format!(
            "expected at least {} lines",
            TOKEN_LINE + 1
        ))
    })?;

    let line = line.trim_end_matches('\r');
    let token = line.strip_prefix(TOKEN_PREFIX).unwrap_or(line);
    if token.is_empty() {
        return Err(AuthenticationError::MalformedResponse(
            "empty auth token".to_string(),
        ));
    }

    Ok(SessionToken::new(token))
}
