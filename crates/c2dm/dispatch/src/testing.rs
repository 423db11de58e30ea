//! In-memory transport for dispatcher tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use c2dm_core::{Credentials, GatewayConfig, NotificationRequest};
use c2dm_gateway::{FormPost, RawResponse, Transport};

pub fn config() -> GatewayConfig {
    GatewayConfig::default()
}

pub fn credentials() -> Credentials {
    Credentials::new("sender@example.com", "secret", "tests")
}

pub fn notifications(count: usize) -> Vec<NotificationRequest> {
    (1..=count)
        .map(|i| {
            NotificationRequest::new(format!("reg-{i}"))
                .unwrap()
                .with_data("message", format!("hello {i}"))
        })
        .collect()
}

pub fn timeout() -> RawResponse {
    RawResponse::Timeout {
        message: "operation timed out".to_string(),
    }
}

pub fn quota_exceeded() -> RawResponse {
    RawResponse::http(200, "Error=QuotaExceeded")
}

/// Answers push requests from per-registration scripts, falling back to
/// success once a script runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    auth_script: Mutex<VecDeque<RawResponse>>,
    pushes: Mutex<Vec<String>>,
    auth_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every push so concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(self, registration_id: &str, responses: Vec<RawResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(registration_id.to_string(), responses.into());
        self
    }

    pub fn script_auth(self, responses: Vec<RawResponse>) -> Self {
        *self.auth_script.lock().unwrap() = responses.into();
        self
    }

    /// Registration ids in the order they were pushed.
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn push_count(&self, registration_id: &str) -> usize {
        self.pushes
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == registration_id)
            .count()
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn authenticate(&self) -> RawResponse {
        let call = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.auth_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RawResponse::http(200, format!("SID=s\nLSID=l\nAuth=token-{call}")))
    }

    fn next_response(&self, registration_id: &str) -> RawResponse {
        self.pushes.lock().unwrap().push(registration_id.to_string());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(registration_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| RawResponse::http(200, format!("id=0:{registration_id}")))
    }
}

impl Transport for ScriptedTransport {
    async fn post(&self, request: &FormPost) -> RawResponse {
        if request.url.ends_with("ClientLogin") {
            return self.authenticate();
        }

        let registration_id = request
            .body
            .split('&')
            .find_map(|pair| pair.strip_prefix("registration_id="))
            .unwrap_or_default()
            .to_string();

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.next_response(&registration_id)
    }
}
