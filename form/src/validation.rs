//! Constraint validation in the spirit of `form.checkValidity()`.
//!
//! Supported constraints: `required` (text-like controls, checkboxes and
//! radio groups), `pattern`, `minlength`, `maxlength` and the `email` input
//! type. Disabled controls, hidden inputs, buttons and fieldsets are barred
//! from validation. Length limits apply to any non-empty value.

use crate::dom::{ControlKind, Document, Element, NodeId};
use regex::Regex;
use std::sync::LazyLock;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Why a control is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Required but empty (or unchecked)
    ValueMissing,
    /// Value does not match `pattern`
    PatternMismatch,
    /// Shorter than `minlength`
    TooShort,
    /// Longer than `maxlength`
    TooLong,
    /// Not a valid value for the input type
    TypeMismatch,
}

/// `true` when every control of `form` satisfies its constraints
#[must_use]
pub fn check_validity(document: &Document, form: NodeId) -> bool {
    first_invalid(document, form).is_none()
}

/// First invalid control of `form` in document order. Fieldsets are never
/// returned.
#[must_use]
pub fn first_invalid(document: &Document, form: NodeId) -> Option<NodeId> {
    document
        .form_controls(form)
        .into_iter()
        .find(|&id| violation(document, form, id).is_some())
}

/// The first violated constraint of `control`, if any.
#[must_use]
pub fn violation(document: &Document, form: NodeId, control: NodeId) -> Option<Violation> {
    let element = document.element(control)?;
    let kind = element.control_kind()?;
    if !is_candidate(element, kind) {
        return None;
    }

    match kind {
        ControlKind::Checkbox => {
            (element.required() && !element.checked()).then_some(Violation::ValueMissing)
        },
        ControlKind::Radio => radio_group_missing(document, form, element)
            .then_some(Violation::ValueMissing),
        ControlKind::Text => text_violation(element),
        _ => None,
    }
}

fn is_candidate(element: &Element, kind: ControlKind) -> bool {
    !element.disabled()
        && matches!(kind, ControlKind::Text | ControlKind::Radio | ControlKind::Checkbox)
        && element.control_type() != "hidden"
}

fn radio_group_missing(document: &Document, form: NodeId, radio: &Element) -> bool {
    let name = radio.name();
    let group: Vec<&Element> = document
        .form_controls(form)
        .into_iter()
        .filter_map(|id| document.element(id))
        .filter(|e| e.control_kind() == Some(ControlKind::Radio))
        .filter(|e| if name.is_empty() { std::ptr::eq(*e, radio) } else { e.name() == name })
        .collect();
    group.iter().any(|e| e.required()) && !group.iter().any(|e| e.checked())
}

fn text_violation(element: &Element) -> Option<Violation> {
    let value = element.value();
    if value.is_empty() {
        return element.required().then_some(Violation::ValueMissing);
    }

    let length = value.chars().count();
    if let Some(min) = length_limit(element, "minlength") {
        if length < min {
            return Some(Violation::TooShort);
        }
    }
    if let Some(max) = length_limit(element, "maxlength") {
        if length > max {
            return Some(Violation::TooLong);
        }
    }

    if element.tag_name() == "input" {
        if element.control_type() == "email" && !is_email(value) {
            return Some(Violation::TypeMismatch);
        }
        if let Some(pattern) = element.attr("pattern").filter(|p| !p.is_empty()) {
            // an unparseable pattern is ignored, as browsers do
            if let Ok(re) = Regex::new(&format!("^(?:{pattern})$")) {
                if !re.is_match(value) {
                    return Some(Violation::PatternMismatch);
                }
            }
        }
    }
    None
}

fn length_limit(element: &Element, attr: &str) -> Option<usize> {
    element.attr(attr)?.trim().parse().ok()
}

fn is_email(value: &str) -> bool {
    EMAIL.as_ref().is_none_or(|re| re.is_match(value))
}
