//! # dynform testing
//!
//! Testing utilities for the dynform engine.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (clock, HTTP, telemetry,
//!   navigation)
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use dynform_testing::{MockHttpClient, RecordingNavigator, RecordingTelemetry, test_clock};
//!
//! #[tokio::test]
//! async fn submits_contact_form() {
//!     let http = MockHttpClient::new()
//!         .on_get("/forms/contact.json", 200, CONTACT_SCHEMA)
//!         .on_post("/forms/contact", 200, "");
//!     let mounted = decorate_with(block, env(http.clone())).await;
//!
//!     mounted.submit().await;
//!     assert_eq!(http.post_count(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use dynform_core::environment::{Clock, Navigator, Telemetry, TelemetryEvent};

pub mod http_mocks;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Navigator, Telemetry, TelemetryEvent, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use dynform_testing::mocks::FixedClock;
    /// use dynform_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Telemetry sink that keeps every reported event.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTelemetry {
        events: Arc<Mutex<Vec<TelemetryEvent>>>,
    }

    impl RecordingTelemetry {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All events reported so far
        #[must_use]
        pub fn events(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Names of all events reported so far, in order
        #[must_use]
        pub fn names(&self) -> Vec<String> {
            self.events().into_iter().map(|e| e.name).collect()
        }
    }

    impl Telemetry for RecordingTelemetry {
        fn report(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }

    /// Navigator that records navigation targets instead of leaving the page.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNavigator {
        visits: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNavigator {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every target navigated to, in order
        #[must_use]
        pub fn visits(&self) -> Vec<String> {
            self.visits
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, target: &str) {
            self.visits
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(target.to_string());
        }
    }
}

// Re-export commonly used items
pub use http_mocks::{MockHttpClient, MockMethod, RecordedRequest};
pub use mocks::{FixedClock, RecordingNavigator, RecordingTelemetry, test_clock};
pub use reducer_test::{ReducerTest, assertions};
