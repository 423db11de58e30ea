//! reqwest-backed transport.

use color_eyre::eyre::WrapErr as _;
use reqwest::header::CONTENT_LENGTH;

use crate::{FormPost, RawResponse, Transport};

/// HTTP transport with a per-request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: std::time::Duration) -> color_eyre::eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Create a transport from the gateway configuration.
    pub fn from_config(config: &c2dm_core::GatewayConfig) -> color_eyre::eyre::Result<Self> {
        Self::new(config.request_timeout())
    }
}

impl Transport for HttpTransport {
    async fn post(&self, request: &FormPost) -> RawResponse {
        let mut builder = self.client.post(&request.url).body(request.body.clone());
        for (name, value) in &request.headers {
            // reqwest derives the length from the body
            if name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&request.url, e),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                tracing::debug!(url = %request.url, status, "received HTTP response");
                RawResponse::Http { status, body }
            }
            Err(e) => transport_failure(&request.url, e),
        }
    }
}

fn transport_failure(url: &str, e: reqwest::Error) -> RawResponse {
    let message = e.to_string();
    if e.is_timeout() {
        tracing::debug!(url, error = %message, "HTTP request timed out");
        RawResponse::Timeout { message }
    } else {
        tracing::debug!(url, error = %message, "HTTP request failed");
        RawResponse::NoResponse { message }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/c2dm/send"))
            .and(header("authorization", "GoogleLogin auth=tok"))
            .and(body_string("registration_id=r&collapse_key=foobar"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id=0:1234"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let request = FormPost::new(
            format!("{}/c2dm/send", server.uri()),
            "registration_id=r&collapse_key=foobar".to_string(),
        )
        .header("Authorization", "GoogleLogin auth=tok")
        .header("Content-length", "37");

        let response = transport.post(&request).await;
        assert_eq!(response, RawResponse::http(200, "id=0:1234"));
    }

    #[tokio::test]
    async fn test_surfaces_non_success_status_as_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(&FormPost::new(server.uri(), String::new()))
            .await;

        assert_eq!(response, RawResponse::http(503, "unavailable"));
    }

    #[tokio::test]
    async fn test_slow_response_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(50)).unwrap();
        let response = transport
            .post(&FormPost::new(server.uri(), String::new()))
            .await;

        assert!(matches!(response, RawResponse::Timeout { .. }), "{response:?}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_no_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(&FormPost::new(format!("http://{addr}"), String::new()))
            .await;

        assert!(matches!(response, RawResponse::NoResponse { .. }), "{response:?}");
    }
}
