//! Property tests for payload serialization.

#![allow(clippy::unwrap_used)]

use dynform::payload::generate_payload;
use dynform::{Document, ElementBuilder, NodeId};
use proptest::prelude::*;
use proptest::sample::Index;

fn form_of(fields: Vec<ElementBuilder>) -> (Document, NodeId) {
    let mut document = Document::new();
    let form = fields
        .into_iter()
        .fold(ElementBuilder::new("form"), ElementBuilder::child);
    let form = document.insert(form);
    (document, form)
}

fn choice(kind: &str, name: &str, value: &str, checked: bool) -> ElementBuilder {
    ElementBuilder::new("input")
        .attr("type", kind)
        .attr("name", name)
        .attr("value", value)
        .flag_if("checked", checked)
}

proptest! {
    #[test]
    fn checked_radio_value_is_submitted(
        values in prop::collection::hash_set("[a-z]{1,6}", 1..6),
        pick in any::<Index>(),
    ) {
        let values: Vec<String> = values.into_iter().collect();
        let checked = pick.index(values.len());
        let radios = values
            .iter()
            .enumerate()
            .map(|(i, v)| choice("radio", "r", v, i == checked))
            .collect();
        let (document, form) = form_of(radios);

        let payload = generate_payload(&document, form);
        prop_assert_eq!(payload.get("r"), Some(values[checked].as_str()));
        prop_assert_eq!(payload.len(), 1);
    }

    #[test]
    fn checked_checkboxes_are_joined_in_order(
        boxes in prop::collection::vec(("[a-z]{1,6}", any::<bool>()), 1..8),
    ) {
        let fields = boxes
            .iter()
            .map(|(v, checked)| choice("checkbox", "c", v, *checked))
            .collect();
        let (document, form) = form_of(fields);

        let expected: Vec<&str> = boxes
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(v, _)| v.as_str())
            .collect();
        let payload = generate_payload(&document, form);
        if expected.is_empty() {
            prop_assert_eq!(payload.get("c"), None);
        } else {
            let joined = expected.join(",");
            prop_assert_eq!(payload.get("c"), Some(joined.as_str()));
        }
    }

    #[test]
    fn disabled_and_nameless_controls_never_appear(
        controls in prop::collection::vec(
            (any::<bool>(), any::<bool>(), "[a-z0-9]{0,8}"),
            0..10,
        ),
    ) {
        let fields = controls
            .iter()
            .enumerate()
            .map(|(i, (named, disabled, value))| {
                let name = if *named { format!("f{i}") } else { String::new() };
                ElementBuilder::new("input")
                    .attr("name", name)
                    .attr("value", value.as_str())
                    .flag_if("disabled", *disabled)
            })
            .collect();
        let (document, form) = form_of(fields);

        let expected: Vec<(String, String)> = controls
            .iter()
            .enumerate()
            .filter(|(_, (named, disabled, _))| *named && !*disabled)
            .map(|(i, (_, _, value))| (format!("f{i}"), value.clone()))
            .collect();
        let actual: Vec<(String, String)> = generate_payload(&document, form)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
