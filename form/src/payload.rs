//! Payload serialization: form controls to a flat name → value map.

use crate::dom::{ControlKind, Document, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values of one submission attempt, in control order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(IndexMap<String, String>);

impl Payload {
    /// Value for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if nothing was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Wire body: `{"data": {<name>: <value>, ...}}`
    #[must_use]
    pub fn to_body(&self) -> Value {
        let data: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut body = Map::new();
        body.insert("data".to_string(), Value::Object(data));
        Value::Object(body)
    }
}

impl FromIterator<(String, String)> for Payload {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Collect the payload of `form`.
///
/// Controls without a name, submit controls, disabled controls and fieldsets
/// are skipped. Radios count only when checked. Checked checkboxes sharing a
/// name are joined with `,` in document order. Every other control
/// contributes its current value; a repeated name keeps the last one.
#[must_use]
pub fn generate_payload(document: &Document, form: NodeId) -> Payload {
    let mut payload = IndexMap::new();

    for id in document.form_controls(form) {
        let Some(field) = document.element(id) else {
            continue;
        };
        let Some(kind) = field.control_kind() else {
            continue;
        };
        if field.name().is_empty() || field.disabled() {
            continue;
        }

        match kind {
            ControlKind::Submit | ControlKind::Fieldset => {},
            ControlKind::Radio => {
                if field.checked() {
                    payload.insert(field.name().to_string(), field.value().to_string());
                }
            },
            ControlKind::Checkbox => {
                if field.checked() {
                    payload
                        .entry(field.name().to_string())
                        .and_modify(|joined: &mut String| {
                            joined.push(',');
                            joined.push_str(field.value());
                        })
                        .or_insert_with(|| field.value().to_string());
                }
            },
            ControlKind::Text | ControlKind::Other => {
                payload.insert(field.name().to_string(), field.value().to_string());
            },
        }
    }

    Payload(payload)
}
