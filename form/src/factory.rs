//! Field factories turn descriptors into detached element trees.
//!
//! The form builder calls the factory once per descriptor, concurrently, and
//! inserts the results in schema order. A factory may return `Ok(None)` for a
//! descriptor that produces no element.

use crate::dom::ElementBuilder;
use crate::error::FieldConstructionError;
use crate::schema::{FieldDescriptor, FieldKind};
use std::future::Future;
use std::pin::Pin;

/// What a factory knows about the form it builds fields for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOwner {
    /// `id` of the form element, used to derive field ids
    pub form_id: String,
    /// Submission target of the form
    pub action: String,
}

/// Result of one field construction.
pub type FieldFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<ElementBuilder>, FieldConstructionError>> + Send + 'a>>;

/// Builds the element for one field descriptor.
///
/// # Dyn Compatibility
///
/// Returns `Pin<Box<dyn Future>>` so builders can hold `Arc<dyn FieldFactory>`.
pub trait FieldFactory: Send + Sync {
    /// Build the field for `descriptor`, or `None` when it renders nothing.
    fn create_field<'a>(
        &'a self,
        descriptor: &'a FieldDescriptor,
        owner: &'a FormOwner,
    ) -> FieldFuture<'a>;
}

/// Reference factory producing plain HTML controls.
///
/// Each field is a `div.field-wrapper` holding a `label` and the control,
/// tagged with `data-fieldset` when the descriptor names a fieldset.
/// Fieldsets are returned bare with a `legend`. `textarea`, `select`,
/// `heading` and `plaintext` are supported as other kinds; any other kind
/// renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFieldFactory;

impl StandardFieldFactory {
    /// Create the factory
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Synchronous construction behind [`FieldFactory::create_field`].
    ///
    /// # Errors
    ///
    /// Returns [`FieldConstructionError::InvalidDescriptor`] for a
    /// fieldset without a name or a `select` without options.
    pub fn build(
        &self,
        descriptor: &FieldDescriptor,
        owner: &FormOwner,
    ) -> Result<Option<ElementBuilder>, FieldConstructionError> {
        let id = field_id(descriptor, owner);
        let field = match &descriptor.kind {
            FieldKind::Fieldset => return fieldset(descriptor, id.as_deref()).map(Some),
            FieldKind::Submit => {
                let label = descriptor
                    .label
                    .as_deref()
                    .or(descriptor.value.as_deref())
                    .unwrap_or("Submit");
                let button = ElementBuilder::new("button")
                    .attr("type", "submit")
                    .attr_opt("id", id.as_deref())
                    .attr_opt("name", non_empty(&descriptor.name))
                    .attr_opt("value", descriptor.value.as_deref())
                    .attr("class", "button")
                    .text(label);
                wrapper(descriptor).child(button)
            },
            FieldKind::Radio | FieldKind::Checkbox => {
                let input = ElementBuilder::new("input")
                    .attr("type", descriptor.kind.as_str())
                    .attr_opt("id", id.as_deref())
                    .attr("name", descriptor.name.as_str())
                    .attr_opt("value", descriptor.value.as_deref())
                    .flag_if("checked", descriptor.checked)
                    .flag_if("required", descriptor.required);
                // label follows the control for choices
                wrapper(descriptor)
                    .child(input)
                    .child_opt(label(descriptor, id.as_deref()))
            },
            FieldKind::Text(input_type) => {
                let input = constrained(descriptor, ElementBuilder::new("input"))
                    .attr("type", input_type.as_str())
                    .attr_opt("id", id.as_deref())
                    .attr("name", descriptor.name.as_str())
                    .attr_opt("value", descriptor.value.as_deref())
                    .attr_opt("placeholder", descriptor.placeholder.as_deref());
                wrapper(descriptor)
                    .child_opt(label(descriptor, id.as_deref()))
                    .child(input)
            },
            FieldKind::Other(kind) => match kind.as_str() {
                "textarea" => {
                    let textarea = constrained(descriptor, ElementBuilder::new("textarea"))
                        .attr_opt("id", id.as_deref())
                        .attr("name", descriptor.name.as_str())
                        .attr_opt("placeholder", descriptor.placeholder.as_deref())
                        .text(descriptor.value.clone().unwrap_or_default());
                    wrapper(descriptor)
                        .child_opt(label(descriptor, id.as_deref()))
                        .child(textarea)
                },
                "select" => {
                    let select = select(descriptor, id.as_deref())?;
                    wrapper(descriptor)
                        .child_opt(label(descriptor, id.as_deref()))
                        .child(select)
                },
                "heading" => wrapper(descriptor).child(
                    ElementBuilder::new("h3").text(text_of(descriptor)),
                ),
                "plaintext" => wrapper(descriptor).child(
                    ElementBuilder::new("p").text(text_of(descriptor)),
                ),
                _ => return Ok(None),
            },
        };
        Ok(Some(field))
    }
}

impl FieldFactory for StandardFieldFactory {
    fn create_field<'a>(
        &'a self,
        descriptor: &'a FieldDescriptor,
        owner: &'a FormOwner,
    ) -> FieldFuture<'a> {
        Box::pin(async move { self.build(descriptor, owner) })
    }
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s).filter(|s| !s.is_empty())
}

fn field_id(descriptor: &FieldDescriptor, owner: &FormOwner) -> Option<String> {
    if let Some(id) = &descriptor.id {
        return Some(id.clone());
    }
    let name = non_empty(&descriptor.name)?;
    match descriptor.kind {
        // radios share a name, so their values keep ids unique
        FieldKind::Radio => {
            let value = descriptor.value.as_deref().unwrap_or("on");
            Some(format!("{}-{name}-{value}", owner.form_id))
        },
        _ => Some(format!("{}-{name}", owner.form_id)),
    }
}

fn wrapper(descriptor: &FieldDescriptor) -> ElementBuilder {
    ElementBuilder::new("div")
        .attr(
            "class",
            format!("field-wrapper {}-wrapper", descriptor.kind.as_str()),
        )
        .attr_opt("data-fieldset", descriptor.fieldset.as_deref())
}

fn label(descriptor: &FieldDescriptor, id: Option<&str>) -> Option<ElementBuilder> {
    let text = descriptor.label.as_deref()?;
    Some(ElementBuilder::new("label").attr_opt("for", id).text(text))
}

fn text_of(descriptor: &FieldDescriptor) -> String {
    descriptor
        .label
        .clone()
        .or_else(|| descriptor.value.clone())
        .unwrap_or_default()
}

fn constrained(descriptor: &FieldDescriptor, element: ElementBuilder) -> ElementBuilder {
    element
        .flag_if("required", descriptor.required)
        .attr_opt("pattern", descriptor.pattern.as_deref())
        .attr_opt("minlength", descriptor.minlength.as_deref())
        .attr_opt("maxlength", descriptor.maxlength.as_deref())
}

fn fieldset(
    descriptor: &FieldDescriptor,
    id: Option<&str>,
) -> Result<ElementBuilder, FieldConstructionError> {
    if descriptor.name.is_empty() {
        return Err(FieldConstructionError::InvalidDescriptor {
            field: descriptor.label.clone().unwrap_or_default(),
            reason: "a fieldset needs a name for fields to join it".to_string(),
        });
    }
    let mut fieldset = ElementBuilder::new("fieldset")
        .attr_opt("id", id)
        .attr("name", descriptor.name.as_str())
        .attr_opt("data-fieldset", descriptor.fieldset.as_deref());
    if let Some(legend) = descriptor.label.as_deref() {
        fieldset = fieldset.child(ElementBuilder::new("legend").text(legend));
    }
    Ok(fieldset)
}

fn select(
    descriptor: &FieldDescriptor,
    id: Option<&str>,
) -> Result<ElementBuilder, FieldConstructionError> {
    if descriptor.options.is_empty() {
        return Err(FieldConstructionError::InvalidDescriptor {
            field: descriptor.name.clone(),
            reason: "a select needs at least one option".to_string(),
        });
    }
    let mut select = ElementBuilder::new("select")
        .attr_opt("id", id)
        .attr("name", descriptor.name.as_str())
        .flag_if("required", descriptor.required);
    if let Some(placeholder) = descriptor.placeholder.as_deref() {
        select = select.child(
            ElementBuilder::new("option")
                .attr("value", "")
                .flag_if("selected", descriptor.value.is_none())
                .flag_if("disabled", true)
                .text(placeholder),
        );
    }
    for option in &descriptor.options {
        select = select.child(
            ElementBuilder::new("option")
                .attr("value", option.as_str())
                .flag_if("selected", descriptor.value.as_deref() == Some(option.as_str()))
                .text(option.as_str()),
        );
    }
    Ok(select)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::dom::{ControlKind, Document};

    fn owner() -> FormOwner {
        FormOwner {
            form_id: "form-contact".to_string(),
            action: "/forms/contact".to_string(),
        }
    }

    fn build(descriptor: &FieldDescriptor) -> (Document, crate::dom::NodeId) {
        let builder = StandardFieldFactory.build(descriptor, &owner()).unwrap().unwrap();
        let mut doc = Document::new();
        let id = doc.insert(builder);
        (doc, id)
    }

    #[test]
    fn text_fields_are_wrapped_with_label() {
        let mut descriptor = FieldDescriptor::new("email", FieldKind::Text("email".into()));
        descriptor.label = Some("Email".into());
        descriptor.required = true;
        descriptor.fieldset = Some("contact".into());

        let (doc, wrapper) = build(&descriptor);
        assert_eq!(
            doc.to_html(wrapper),
            "<div class=\"field-wrapper email-wrapper\" data-fieldset=\"contact\">\
             <label for=\"form-contact-email\">Email</label>\
             <input required type=\"email\" id=\"form-contact-email\" name=\"email\"></div>"
        );
    }

    #[test]
    fn submit_becomes_a_submit_button() {
        let mut descriptor = FieldDescriptor::new("", FieldKind::Submit);
        descriptor.label = Some("Send".into());
        let (doc, wrapper) = build(&descriptor);
        let button = doc.query(wrapper, |e| e.tag_name() == "button").unwrap();
        let element = doc.element(button).unwrap();
        assert_eq!(element.control_kind(), Some(ControlKind::Submit));
        assert_eq!(doc.text_content(button), "Send");
    }

    #[test]
    fn fieldsets_are_not_wrapped() {
        let mut descriptor = FieldDescriptor::new("addr", FieldKind::Fieldset);
        descriptor.label = Some("Address".into());
        let (doc, fieldset) = build(&descriptor);
        let element = doc.element(fieldset).unwrap();
        assert_eq!(element.tag_name(), "fieldset");
        assert_eq!(element.name(), "addr");
        assert_eq!(doc.text_content(fieldset), "Address");
    }

    #[test]
    fn nameless_fieldset_is_rejected() {
        let descriptor = FieldDescriptor::new("", FieldKind::Fieldset);
        let error = StandardFieldFactory.build(&descriptor, &owner()).unwrap_err();
        assert!(matches!(error, FieldConstructionError::InvalidDescriptor { .. }));
    }

    #[test]
    fn radios_get_value_based_ids() {
        let mut descriptor = FieldDescriptor::new("size", FieldKind::Radio);
        descriptor.value = Some("m".into());
        descriptor.checked = true;
        let (doc, wrapper) = build(&descriptor);
        let radio = doc.query(wrapper, |e| e.tag_name() == "input").unwrap();
        let element = doc.element(radio).unwrap();
        assert_eq!(element.attr("id"), Some("form-contact-size-m"));
        assert!(element.checked());
        assert_eq!(element.value(), "m");
    }

    #[test]
    fn select_uses_matching_option() {
        let mut descriptor = FieldDescriptor::new("topic", FieldKind::Other("select".into()));
        descriptor.options = vec!["sales".into(), "support".into()];
        descriptor.value = Some("support".into());
        let (doc, wrapper) = build(&descriptor);
        let select = doc.query(wrapper, |e| e.tag_name() == "select").unwrap();
        assert_eq!(doc.element(select).unwrap().value(), "support");
    }

    #[test]
    fn select_without_options_is_rejected() {
        let descriptor = FieldDescriptor::new("topic", FieldKind::Other("select".into()));
        assert!(StandardFieldFactory.build(&descriptor, &owner()).is_err());
    }

    #[test]
    fn unknown_kinds_render_nothing() {
        let descriptor = FieldDescriptor::new("x", FieldKind::Other("spacer".into()));
        assert_eq!(StandardFieldFactory.build(&descriptor, &owner()).unwrap(), None);
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let factory: std::sync::Arc<dyn FieldFactory> = std::sync::Arc::new(StandardFieldFactory);
        let descriptor = FieldDescriptor::new("name", FieldKind::Text("text".into()));
        let owner = owner();
        let field = factory.create_field(&descriptor, &owner).await.unwrap();
        assert!(field.is_some());
    }
}
