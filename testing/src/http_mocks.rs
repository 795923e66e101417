//! Scripted HTTP transport for form tests
//!
//! [`MockHttpClient`] implements [`HttpClient`] with canned responses per
//! route and records every request it receives, so tests can assert on the
//! exact wire traffic a form produced.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use dynform_core::environment::{HttpClient, HttpFuture, HttpResponse, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// HTTP method of a recorded or scripted request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// A request observed by [`MockHttpClient`]
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    /// Request method
    pub method: MockMethod,
    /// Path or URL exactly as the caller passed it
    pub url: String,
    /// JSON body (`None` for `GET`)
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Debug)]
enum MockReply {
    Respond(HttpResponse),
    Fail(TransportError),
}

type Routes = HashMap<(MockMethod, String), VecDeque<MockReply>>;

/// Scripted HTTP client.
///
/// Replies registered for a route are consumed in order; the last one keeps
/// answering once the queue is down to a single entry. Unscripted routes
/// answer `404`.
///
/// # Example
///
/// ```
/// use dynform_testing::MockHttpClient;
///
/// let http = MockHttpClient::new()
///     .on_get("/forms/contact.json", 200, r#"{"data":[]}"#)
///     .on_post("/forms/contact", 400, "bad field");
/// assert_eq!(http.post_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    post_gate: Option<Arc<Semaphore>>,
}

impl MockHttpClient {
    /// Create a client with no scripted routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, method: MockMethod, url: &str, reply: MockReply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Answer `GET url` with `status` and `body`
    #[must_use]
    pub fn on_get(self, url: &str, status: u16, body: &str) -> Self {
        self.script(MockMethod::Get, url, MockReply::Respond(HttpResponse::new(status, body)))
    }

    /// Answer `POST url` with `status` and `body`
    #[must_use]
    pub fn on_post(self, url: &str, status: u16, body: &str) -> Self {
        self.script(MockMethod::Post, url, MockReply::Respond(HttpResponse::new(status, body)))
    }

    /// Fail `GET url` before any status is received
    #[must_use]
    pub fn fail_get(self, url: &str, message: &str) -> Self {
        self.script(
            MockMethod::Get,
            url,
            MockReply::Fail(TransportError::RequestFailed(message.to_string())),
        )
    }

    /// Fail `POST url` before any status is received
    #[must_use]
    pub fn fail_post(self, url: &str, message: &str) -> Self {
        self.script(
            MockMethod::Post,
            url,
            MockReply::Fail(TransportError::RequestFailed(message.to_string())),
        )
    }

    /// Hold every `POST` until [`release_posts`](Self::release_posts) lets it through.
    ///
    /// The request is recorded as soon as it is issued; only the reply waits.
    #[must_use]
    pub fn with_post_gate(mut self) -> Self {
        self.post_gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `count` gated `POST`s complete
    pub fn release_posts(&self, count: usize) {
        if let Some(gate) = &self.post_gate {
            gate.add_permits(count);
        }
    }

    /// Every request seen so far, in arrival order
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Only the `POST` requests
    #[must_use]
    pub fn posts(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == MockMethod::Post)
            .collect()
    }

    /// Number of `POST` requests issued
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.posts().len()
    }

    fn record(&self, method: MockMethod, url: &str, body: Option<serde_json::Value>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
    }

    fn next_reply(&self, method: MockMethod, url: &str) -> MockReply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, url.to_string())) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| MockReply::Respond(HttpResponse::new(404, "not found"))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| MockReply::Respond(HttpResponse::new(404, "not found"))),
            None => MockReply::Respond(HttpResponse::new(404, "not found")),
        }
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, url: String) -> HttpFuture<'_> {
        self.record(MockMethod::Get, &url, None);
        let reply = self.next_reply(MockMethod::Get, &url);
        Box::pin(async move {
            match reply {
                MockReply::Respond(response) => Ok(response),
                MockReply::Fail(error) => Err(error),
            }
        })
    }

    fn post_json(&self, url: String, body: serde_json::Value) -> HttpFuture<'_> {
        self.record(MockMethod::Post, &url, Some(body));
        let reply = self.next_reply(MockMethod::Post, &url);
        let gate = self.post_gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            match reply {
                MockReply::Respond(response) => Ok(response),
                MockReply::Fail(error) => Err(error),
            }
        })
    }
}
