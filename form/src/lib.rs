//! # dynform
//!
//! Schema-driven forms: a page block links to a JSON schema, the engine
//! builds the form it describes, and submissions go out as JSON with a
//! single-flight guard.
//!
//! ## Example
//!
//! ```no_run
//! use dynform::{
//!     BrowsingContext, Decorator, Document, ElementBuilder, FormBuilder, FormConfig,
//!     FormEnvironment, ReqwestHttpClient, StandardFieldFactory, TracingTelemetry,
//! };
//! use dynform_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let config = FormConfig::from_env();
//! let http = Arc::new(ReqwestHttpClient::new(config.base_url.clone()));
//! let environment = FormEnvironment::new(
//!     http.clone(),
//!     Arc::new(TracingTelemetry),
//!     Arc::new(BrowsingContext::new()),
//!     Arc::new(SystemClock),
//!     &config,
//! );
//! let builder = FormBuilder::new(http, Arc::new(StandardFieldFactory::new()), config);
//! let decorator = Decorator::new(builder, environment);
//!
//! let mut document = Document::new();
//! let block = document.insert(
//!     ElementBuilder::new("div")
//!         .child(ElementBuilder::new("a").attr("href", "/forms/contact.json")),
//! );
//! document.append_child(document.body(), block).ok();
//!
//! if let Some(form) = decorator.decorate(document, block).await.mounted() {
//!     form.set_value("email", "someone@example.com").await.ok();
//!     let outcome = form.submit_and_wait().await;
//!     println!("{outcome:?}");
//! }
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: the JSON schema format
//! - [`factory`]: field descriptors to elements
//! - [`builder`]: schema fetch, concurrent field construction, fieldset grouping
//! - [`payload`]: form controls to the submitted JSON object
//! - [`validation`]: constraint validation run before submitting
//! - [`submission`]: the submission reducer and its single-flight guard
//! - [`decorate`]: the entry point tying it together

pub mod builder;
pub mod config;
pub mod decorate;
pub mod dom;
pub mod error;
pub mod factory;
pub mod http;
pub mod navigation;
pub mod payload;
pub mod schema;
pub mod submission;
pub mod telemetry;
pub mod validation;

// Re-export main types for convenience
pub use builder::{BuiltForm, FormBuilder, SubmissionTargetFallback};
pub use config::FormConfig;
pub use decorate::{Decoration, Decorator, FormStore, MountedForm};
pub use dom::{Document, Element, ElementBuilder, NodeId};
pub use error::{BuildError, DomError, FieldConstructionError, SubmissionError};
pub use factory::{FieldFactory, FormOwner, StandardFieldFactory};
pub use http::ReqwestHttpClient;
pub use navigation::BrowsingContext;
pub use payload::{generate_payload, Payload};
pub use schema::{FieldDescriptor, FieldKind, FormSchema};
pub use submission::{
    FormAction, FormEnvironment, FormReducer, FormState, SubmissionOutcome, SubmissionPhase,
};
pub use telemetry::TracingTelemetry;
