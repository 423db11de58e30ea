//! Form body encoding for the auth and push endpoints.

use c2dm_core::{Credentials, GatewayConfig, NotificationRequest, SessionToken};

use crate::FormPost;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the ClientLogin request.
pub fn auth_request(config: &GatewayConfig, credentials: &Credentials) -> FormPost {
    let body = format!(
        "accountType={}&Email={}&Passwd={}&service={}&source={}",
        urlencoding::encode(&config.account_type),
        urlencoding::encode(&credentials.username),
        urlencoding::encode(&credentials.password),
        urlencoding::encode(&config.service),
        urlencoding::encode(&credentials.source),
    );
    let length = body.len().to_string();

    FormPost::new(config.auth_url.clone(), body)
        .header("Content-type", FORM_CONTENT_TYPE)
        .header("Content-length", length)
}

/// Build the push request for one notification.
pub fn push_request(
    config: &GatewayConfig,
    token: &SessionToken,
    notification: &NotificationRequest,
) -> FormPost {
    let mut body = format!(
        "registration_id={}&collapse_key={}",
        notification.registration_id(),
        config.collapse_key
    );
    for (key, value) in notification.key_value_pairs() {
        body.push_str("&data.");
        body.push_str(key);
        body.push('=');
        body.push_str(&urlencoding::encode(value));
    }

    FormPost::new(config.push_url.clone(), body)
        .header("Content-type", FORM_CONTENT_TYPE)
        .header("Authorization", token.authorization_header())
}
