//! Form builder: fetches a schema, builds the fields and groups fieldsets.
//!
//! ```text
//! href ──► pathname ──► GET pathname ──► FormSchema
//!                                           │
//!              ┌──── factory per field (concurrent, joined) ────┐
//!              ▼                                                ▼
//!        <form> ◄── append in schema order ◄── filter empty results
//!              │
//!              └──► move [data-fieldset=name] into fieldset[name]
//! ```

use crate::config::FormConfig;
use crate::dom::{Document, ElementBuilder, NodeId};
use crate::error::{BuildError, DomError};
use crate::factory::{FieldFactory, FormOwner};
use crate::schema::FormSchema;
use dynform_core::environment::HttpClient;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a form posts when its schema names no `submission.url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionTargetFallback {
    /// The schema pathname up to its first `.json` (`/forms/contact.json`
    /// posts to `/forms/contact`)
    #[default]
    StripJsonSuffix,
    /// No fallback: schemas must name their target
    Disabled,
    /// Always this URL
    Fixed(String),
}

impl SubmissionTargetFallback {
    /// Parse `strip-json`, `disabled`, or treat the value as a fixed URL
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "strip-json" | "strip-json-suffix" | "strip" => Self::StripJsonSuffix,
            "disabled" | "none" | "off" => Self::Disabled,
            _ => Self::Fixed(trimmed.to_string()),
        }
    }

    /// Target derived for a schema fetched from `pathname`; never empty
    #[must_use]
    pub fn target_for(&self, pathname: &str) -> Option<String> {
        let target = match self {
            Self::StripJsonSuffix => pathname.split(".json").next().unwrap_or(pathname),
            Self::Disabled => return None,
            Self::Fixed(url) => url.as_str(),
        };
        Some(target.to_string()).filter(|t| !t.is_empty())
    }
}

/// Submission target: the schema's `submission.url`, else the fallback.
#[must_use]
pub fn submission_target(
    schema: &FormSchema,
    pathname: &str,
    fallback: &SubmissionTargetFallback,
) -> Option<String> {
    schema
        .submission_url()
        .map(str::to_string)
        .or_else(|| fallback.target_for(pathname))
}

/// A form built into a document (still detached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltForm {
    /// The `form` element
    pub form: NodeId,
    /// Submission target
    pub action: String,
    /// Redirect target after a successful submission
    pub confirmation: Option<String>,
    /// Pathname the schema was fetched from
    pub pathname: String,
    /// Number of top-level fields the factory produced
    pub field_count: usize,
}

/// Builds forms from schemas.
#[derive(Clone)]
pub struct FormBuilder {
    http: Arc<dyn HttpClient>,
    factory: Arc<dyn FieldFactory>,
    config: FormConfig,
}

impl FormBuilder {
    /// Create a builder
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        factory: Arc<dyn FieldFactory>,
        config: FormConfig,
    ) -> Self {
        Self {
            http,
            factory,
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Pathname of `href`, resolved against the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidResource`] when `href` is not a URL.
    pub fn resolve_pathname(&self, href: &str) -> Result<String, BuildError> {
        let url = self
            .config
            .base_url
            .join(href)
            .map_err(|e| BuildError::InvalidResource {
                href: href.to_string(),
                reason: e.to_string(),
            })?;
        Ok(url.path().to_string())
    }

    /// `GET` and parse the schema at `pathname`.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Transport`] if the request fails
    /// - [`BuildError::SchemaFetch`] for non-2xx responses
    /// - [`BuildError::SchemaParse`] for malformed bodies
    pub async fn fetch_schema(&self, pathname: &str) -> Result<FormSchema, BuildError> {
        debug!(pathname, "Fetching form schema");
        let response = self.http.get(pathname.to_string()).await?;
        if !response.is_success() {
            return Err(BuildError::SchemaFetch {
                status: response.status,
            });
        }
        FormSchema::from_json(&response.body).map_err(|e| BuildError::SchemaParse(e.to_string()))
    }

    /// Build the form referenced by `href` into `document`.
    ///
    /// The form is left detached; the caller mounts it.
    ///
    /// # Errors
    ///
    /// Any [`BuildError`]. A failing field aborts the whole build.
    #[tracing::instrument(skip_all, fields(href = %href))]
    pub async fn build(&self, document: &mut Document, href: &str) -> Result<BuiltForm, BuildError> {
        let pathname = self.resolve_pathname(href)?;
        let schema = self.fetch_schema(&pathname).await?;

        let action = submission_target(&schema, &pathname, &self.config.submission_fallback)
            .ok_or_else(|| BuildError::MissingSubmissionTarget {
                pathname: pathname.clone(),
            })?;
        let confirmation = schema.confirmation().map(str::to_string);
        let owner = FormOwner {
            form_id: form_id(&pathname),
            action: action.clone(),
        };

        let fields = try_join_all(
            schema
                .data
                .iter()
                .map(|descriptor| self.factory.create_field(descriptor, &owner)),
        )
        .await?;

        let form = document.insert(ElementBuilder::new("form").attr("id", owner.form_id.as_str()));
        let mut field_count = 0;
        for field in fields.into_iter().flatten() {
            let node = document.insert(field);
            document.append_child(form, node)?;
            field_count += 1;
        }
        let grouped = group_fieldsets(document, form)?;

        info!(
            pathname = %pathname,
            action = %action,
            fields = field_count,
            grouped,
            "Form built"
        );
        metrics::counter!("dynform.forms.built").increment(1);

        Ok(BuiltForm {
            form,
            action,
            confirmation,
            pathname,
            field_count,
        })
    }
}

/// `id` for the form built from `pathname`: `form-` plus the last path
/// segment without `.json`, non-alphanumerics replaced by `-`.
#[must_use]
pub fn form_id(pathname: &str) -> String {
    let stem = pathname
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default();
    let stem = stem.strip_suffix(".json").unwrap_or(stem);
    let slug: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "form".to_string()
    } else {
        format!("form-{slug}")
    }
}

/// Move every element of `form` whose `data-fieldset` names a fieldset into
/// that fieldset, in document order. Fieldsets are visited in document order
/// as found before any move. An element is never moved into itself or into
/// one of its own descendants. Returns the number of moves.
///
/// # Errors
///
/// Propagates [`DomError`] from the moves.
pub fn group_fieldsets(document: &mut Document, form: NodeId) -> Result<usize, DomError> {
    let fieldsets = document.query_all(form, |e| e.tag_name() == "fieldset");
    let mut moved = 0;

    for fieldset in fieldsets {
        let name = document
            .element(fieldset)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let members =
            document.query_all(form, |e| e.attr("data-fieldset") == Some(name.as_str()));
        for member in members {
            if document.contains(member, fieldset) {
                continue;
            }
            document.append_child(fieldset, member)?;
            moved += 1;
        }
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn strip_json_suffix_cuts_at_first_json() {
        let fallback = SubmissionTargetFallback::StripJsonSuffix;
        assert_eq!(
            fallback.target_for("/forms/contact.json"),
            Some("/forms/contact".to_string())
        );
        assert_eq!(
            fallback.target_for("/forms/contact"),
            Some("/forms/contact".to_string())
        );
        assert_eq!(fallback.target_for(".json"), None);
    }

    #[test]
    fn other_fallback_policies() {
        assert_eq!(SubmissionTargetFallback::Disabled.target_for("/f.json"), None);
        assert_eq!(
            SubmissionTargetFallback::Fixed("/api/forms".into()).target_for("/f.json"),
            Some("/api/forms".to_string())
        );
    }

    #[test]
    fn parses_fallback_names() {
        assert_eq!(
            SubmissionTargetFallback::parse("strip-json"),
            SubmissionTargetFallback::StripJsonSuffix
        );
        assert_eq!(
            SubmissionTargetFallback::parse(" Disabled "),
            SubmissionTargetFallback::Disabled
        );
        assert_eq!(
            SubmissionTargetFallback::parse("https://api.example.com/forms"),
            SubmissionTargetFallback::Fixed("https://api.example.com/forms".into())
        );
    }

    #[test]
    fn schema_url_beats_fallback() {
        let schema =
            FormSchema::from_json(r#"{"data":[],"submission":{"url":"/api/sub"}}"#).unwrap();
        assert_eq!(
            submission_target(&schema, "/f.json", &SubmissionTargetFallback::Disabled),
            Some("/api/sub".to_string())
        );
    }

    #[test]
    fn form_ids_are_slugs() {
        assert_eq!(form_id("/forms/contact.json"), "form-contact");
        assert_eq!(form_id("/forms/Sign Up.json"), "form-sign-up");
        assert_eq!(form_id("/"), "form");
    }

    #[test]
    fn grouping_handles_nested_fieldsets() {
        let mut doc = Document::new();
        let form = doc.insert(
            ElementBuilder::new("form")
                .child(ElementBuilder::new("fieldset").attr("name", "outer"))
                .child(
                    ElementBuilder::new("fieldset")
                        .attr("name", "inner")
                        .attr("data-fieldset", "outer"),
                )
                .child(ElementBuilder::new("div").attr("data-fieldset", "inner"))
                .child(ElementBuilder::new("div").attr("data-fieldset", "missing")),
        );
        let moved = group_fieldsets(&mut doc, form).unwrap();
        assert_eq!(moved, 2);

        let outer = doc.query(form, |e| e.name() == "outer").unwrap();
        let inner = doc.query(form, |e| e.name() == "inner").unwrap();
        let member = doc
            .query(form, |e| e.attr("data-fieldset") == Some("inner"))
            .unwrap();
        let stray = doc
            .query(form, |e| e.attr("data-fieldset") == Some("missing"))
            .unwrap();
        assert_eq!(doc.parent(inner), Some(outer));
        assert_eq!(doc.parent(member), Some(inner));
        assert_eq!(doc.parent(stray), Some(form));
    }

    #[test]
    fn fieldset_naming_itself_is_not_moved_into_itself() {
        let mut doc = Document::new();
        let form = doc.insert(
            ElementBuilder::new("form").child(
                ElementBuilder::new("fieldset")
                    .attr("name", "loop")
                    .attr("data-fieldset", "loop"),
            ),
        );
        assert_eq!(group_fieldsets(&mut doc, form).unwrap(), 0);
    }
}
