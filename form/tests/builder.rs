//! Form builder against scripted schemas.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use dynform::builder::{BuiltForm, FormBuilder, SubmissionTargetFallback};
use dynform::dom::{Document, NodeId};
use dynform::error::{BuildError, FieldConstructionError};
use dynform::factory::{FieldFactory, FieldFuture, FormOwner, StandardFieldFactory};
use dynform::schema::FieldDescriptor;
use dynform::FormConfig;
use dynform_testing::{MockHttpClient, MockMethod};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CONTACT_SCHEMA: &str = r#"{
    "data": [
        {"name": "contact", "type": "fieldset", "label": "Contact"},
        {"name": "email", "type": "email", "label": "Email", "required": true, "fieldset": "contact"},
        {"name": "size", "type": "radio", "value": "s", "label": "Small"},
        {"name": "size", "type": "radio", "value": "m", "label": "Medium", "checked": true},
        {"name": "gadget", "type": "hologram"},
        {"name": "phone", "type": "tel", "label": "Phone", "fieldset": "contact"},
        {"type": "submit", "label": "Send"}
    ],
    "submission": {"url": "/api/sub", "confirmation": "/thanks"}
}"#;

fn builder_with(http: MockHttpClient, factory: Arc<dyn FieldFactory>) -> FormBuilder {
    FormBuilder::new(Arc::new(http), factory, FormConfig::default())
}

fn standard_builder(http: MockHttpClient) -> FormBuilder {
    builder_with(http, Arc::new(StandardFieldFactory::new()))
}

async fn build(builder: &FormBuilder, href: &str) -> (Document, Result<BuiltForm, BuildError>) {
    let mut document = Document::new();
    let result = builder.build(&mut document, href).await;
    (document, result)
}

fn control_names(document: &Document, form: NodeId) -> Vec<String> {
    document
        .form_controls(form)
        .into_iter()
        .filter_map(|id| document.element(id))
        .map(|e| e.name().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Delegates to the standard factory after sleeping `delay` milliseconds and
/// records the order in which fields finish.
#[derive(Default)]
struct DelayedFactory {
    finished: Mutex<Vec<String>>,
}

impl FieldFactory for DelayedFactory {
    fn create_field<'a>(
        &'a self,
        descriptor: &'a FieldDescriptor,
        owner: &'a FormOwner,
    ) -> FieldFuture<'a> {
        Box::pin(async move {
            let delay = descriptor
                .extra
                .get("delay")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.finished.lock().unwrap().push(descriptor.name.clone());
            StandardFieldFactory::new().build(descriptor, owner)
        })
    }
}

#[tokio::test]
async fn fields_follow_schema_order_whatever_order_they_finish_in() {
    let schema = r#"{"data": [
        {"name": "first", "delay": 60},
        {"name": "second", "delay": 0},
        {"name": "third", "delay": 30}
    ]}"#;
    let factory = Arc::new(DelayedFactory::default());
    let builder = builder_with(
        MockHttpClient::new().on_get("/forms/slow.json", 200, schema),
        factory.clone(),
    );

    let (document, result) = build(&builder, "/forms/slow.json").await;
    let built = result.unwrap();

    assert_eq!(*factory.finished.lock().unwrap(), vec!["second", "third", "first"]);
    assert_eq!(control_names(&document, built.form), vec!["first", "second", "third"]);
    assert_eq!(built.field_count, 3);
}

#[tokio::test]
async fn empty_factory_results_are_skipped() {
    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 200, CONTACT_SCHEMA),
    );
    let (document, result) = build(&builder, "/forms/contact.json").await;
    let built = result.unwrap();

    // seven descriptors, the hologram renders nothing
    assert_eq!(built.field_count, 6);
    assert!(!document.to_html(built.form).contains("gadget"));
}

#[tokio::test]
async fn fields_join_their_named_fieldset() {
    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 200, CONTACT_SCHEMA),
    );
    let (document, result) = build(&builder, "/forms/contact.json").await;
    let built = result.unwrap();

    let fieldset = document
        .query(built.form, |e| e.tag_name() == "fieldset" && e.name() == "contact")
        .unwrap();
    assert_eq!(control_names(&document, fieldset), vec!["email", "phone"]);
    for member in document.query_all(built.form, |e| e.attr("data-fieldset") == Some("contact")) {
        assert_eq!(document.parent(member), Some(fieldset));
    }
    assert_eq!(
        control_names(&document, built.form),
        vec!["contact", "email", "phone", "size", "size"]
    );
}

#[tokio::test]
async fn schema_targets_are_used() {
    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 200, CONTACT_SCHEMA),
    );
    let (document, result) = build(&builder, "/forms/contact.json").await;
    let built = result.unwrap();

    assert_eq!(built.action, "/api/sub");
    assert_eq!(built.confirmation.as_deref(), Some("/thanks"));
    assert_eq!(built.pathname, "/forms/contact.json");
    let form = document.element(built.form).unwrap();
    assert_eq!(form.attr("id"), Some("form-contact"));
    assert!(!document.is_connected(built.form));
}

#[tokio::test]
async fn schema_is_fetched_from_the_href_pathname() {
    let http = MockHttpClient::new().on_get("/forms/contact.json", 200, r#"{"data": []}"#);
    let builder = standard_builder(http.clone());

    let (_, result) = build(&builder, "https://cdn.example.com/forms/contact.json?v=2#top").await;
    let built = result.unwrap();

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, MockMethod::Get);
    assert_eq!(requests[0].url, "/forms/contact.json");
    assert_eq!(built.action, "/forms/contact");
    assert_eq!(built.confirmation, None);
}

#[tokio::test]
async fn fallback_policy_decides_missing_targets() {
    let schema = r#"{"data": [], "submission": {"url": ""}}"#;

    let disabled = FormBuilder::new(
        Arc::new(MockHttpClient::new().on_get("/forms/contact.json", 200, schema)),
        Arc::new(StandardFieldFactory::new()),
        FormConfig::default().with_submission_fallback(SubmissionTargetFallback::Disabled),
    );
    let (_, result) = build(&disabled, "/forms/contact.json").await;
    assert_eq!(
        result.unwrap_err(),
        BuildError::MissingSubmissionTarget {
            pathname: "/forms/contact.json".to_string()
        }
    );

    let fixed = FormBuilder::new(
        Arc::new(MockHttpClient::new().on_get("/forms/contact.json", 200, schema)),
        Arc::new(StandardFieldFactory::new()),
        FormConfig::default()
            .with_submission_fallback(SubmissionTargetFallback::Fixed("/api/forms".into())),
    );
    let (_, result) = build(&fixed, "/forms/contact.json").await;
    assert_eq!(result.unwrap().action, "/api/forms");
}

#[tokio::test]
async fn schema_http_error_fails_the_build() {
    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 500, "boom"),
    );
    let (_, result) = build(&builder, "/forms/contact.json").await;
    let error = result.unwrap_err();

    assert_eq!(error, BuildError::SchemaFetch { status: 500 });
    assert_eq!(error.to_string(), "Failed to load form config: 500");
}

#[tokio::test]
async fn unscripted_schema_is_a_404() {
    let builder = standard_builder(MockHttpClient::new());
    let (_, result) = build(&builder, "/forms/missing.json").await;
    assert_eq!(result.unwrap_err(), BuildError::SchemaFetch { status: 404 });
}

#[tokio::test]
async fn transport_and_parse_failures_fail_the_build() {
    let builder = standard_builder(
        MockHttpClient::new().fail_get("/forms/contact.json", "connection reset"),
    );
    let (_, result) = build(&builder, "/forms/contact.json").await;
    assert!(matches!(result.unwrap_err(), BuildError::Transport(_)));

    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 200, r#"{"fields": []}"#),
    );
    let (_, result) = build(&builder, "/forms/contact.json").await;
    assert!(matches!(result.unwrap_err(), BuildError::SchemaParse(_)));
}

#[tokio::test]
async fn one_failing_field_fails_the_build() {
    let schema = r#"{"data": [
        {"name": "ok"},
        {"name": "choice", "type": "select"}
    ]}"#;
    let builder = standard_builder(
        MockHttpClient::new().on_get("/forms/contact.json", 200, schema),
    );
    let (_, result) = build(&builder, "/forms/contact.json").await;

    match result.unwrap_err() {
        BuildError::FieldConstruction(FieldConstructionError::InvalidDescriptor { field, .. }) => {
            assert_eq!(field, "choice");
        },
        other => panic!("unexpected error: {other:?}"),
    }
}
