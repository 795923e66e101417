//! Environment traits: the collaborators a form talks to.
//!
//! # Implementations
//!
//! - Production: `SystemClock` (here), `ReqwestHttpClient`, `TracingTelemetry`
//!   and `BrowsingContext` (in the `dynform` crate)
//! - Testing: `FixedClock`, `MockHttpClient`, `RecordingTelemetry`,
//!   `RecordingNavigator` (in the `dynform-testing` crate)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A response as seen by the form engine: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl HttpResponse {
    /// Create a response
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for 2xx statuses
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors raised before an HTTP status is available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The target could not be turned into a request URL
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL or path
        url: String,
        /// Parser message
        reason: String,
    },

    /// Connection, TLS or body read failure
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Boxed future returned by [`HttpClient`] methods.
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// HTTP transport used for schema fetches and submissions.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be stored as `Arc<dyn HttpClient>` inside an environment.
///
/// Non-2xx statuses are NOT errors at this layer; callers decide what a
/// status means.
pub trait HttpClient: Send + Sync {
    /// `GET` a path or absolute URL
    fn get(&self, url: String) -> HttpFuture<'_>;

    /// `POST` a JSON body with `Content-Type: application/json`
    fn post_json(&self, url: String, body: serde_json::Value) -> HttpFuture<'_>;
}

/// Detail attached to a telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryDetail {
    /// Component that produced the event (e.g. `.form`)
    pub source: String,
    /// Event subject: the submission URL, or the error text
    pub target: String,
}

/// A telemetry event such as `form:submit` or `form:error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event name
    pub name: String,
    /// Event detail
    pub detail: TelemetryDetail,
    /// When the event was recorded
    pub at: DateTime<Utc>,
}

/// Telemetry sink.
pub trait Telemetry: Send + Sync {
    /// Report one event. Sinks must not fail the caller.
    fn report(&self, event: TelemetryEvent);
}

/// The browsing context a form lives in.
pub trait Navigator: Send + Sync {
    /// Navigate to `target` (the equivalent of assigning `location.href`)
    fn navigate(&self, target: &str);
}
