//! Transport traits.

/// A form-encoded POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPost {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl FormPost {
    pub fn new(url: impl Into<String>, body: String) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the transport observed for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// The transport gave up waiting for the response.
    Timeout { message: String },
    /// No HTTP response at all (connect, TLS, or protocol failure).
    NoResponse { message: String },
    /// An HTTP response with any status.
    Http { status: u16, body: String },
}

impl RawResponse {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }
}

/// Low-level HTTP transport.
///
/// Implementations surface failures as [`RawResponse`] variants instead of
/// errors so every attempt can be classified.
#[trait_variant::make(Send)]
pub trait Transport: Send + Sync {
    /// Send one POST and wait for its completion.
    async fn post(&self, request: &FormPost) -> RawResponse;
}
