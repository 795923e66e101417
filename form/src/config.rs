//! Engine configuration.
//!
//! Loads from `DYNFORM_*` environment variables with sensible defaults;
//! every value can also be set in code with the `with_*` builders.

use crate::builder::SubmissionTargetFallback;
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Default telemetry `source` for form events.
pub const DEFAULT_TELEMETRY_SOURCE: &str = ".form";

/// Default text shown when a form cannot be built.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Sorry, the form could not be loaded.";

/// Default base URL relative trigger links are resolved against.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Form engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Page URL relative `href`s resolve against (`DYNFORM_BASE_URL`)
    pub base_url: Url,
    /// `source` of telemetry events (`DYNFORM_TELEMETRY_SOURCE`)
    pub telemetry_source: String,
    /// Paragraph text rendered when building fails (`DYNFORM_FALLBACK_MESSAGE`)
    pub fallback_message: String,
    /// Submission target when the schema has none (`DYNFORM_SUBMISSION_FALLBACK`:
    /// `strip-json`, `disabled`, or a fixed URL)
    pub submission_fallback: SubmissionTargetFallback,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            telemetry_source: DEFAULT_TELEMETRY_SOURCE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            submission_fallback: SubmissionTargetFallback::default(),
        }
    }
}

#[allow(clippy::expect_used)] // constant input
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

impl FormConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; an unparseable base URL is
    /// logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = present("DYNFORM_BASE_URL")
            .and_then(|raw| match Url::parse(raw.trim()) {
                Ok(url) => Some(url),
                Err(error) => {
                    tracing::warn!(value = %raw, %error, "Ignoring invalid DYNFORM_BASE_URL");
                    None
                },
            })
            .unwrap_or(defaults.base_url);

        Self {
            base_url,
            telemetry_source: present("DYNFORM_TELEMETRY_SOURCE")
                .unwrap_or(defaults.telemetry_source),
            fallback_message: present("DYNFORM_FALLBACK_MESSAGE")
                .unwrap_or(defaults.fallback_message),
            submission_fallback: present("DYNFORM_SUBMISSION_FALLBACK")
                .map_or(defaults.submission_fallback, |raw| {
                    SubmissionTargetFallback::parse(&raw)
                }),
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the telemetry source
    #[must_use]
    pub fn with_telemetry_source(mut self, source: impl Into<String>) -> Self {
        self.telemetry_source = source.into();
        self
    }

    /// Set the fallback message
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Set the submission target fallback policy
    #[must_use]
    pub fn with_submission_fallback(mut self, fallback: SubmissionTargetFallback) -> Self {
        self.submission_fallback = fallback;
        self
    }
}
