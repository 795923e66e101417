//! Form schema as served next to the page: `{ data: [...], submission?: {...} }`.
//!
//! Schemas are often exported from spreadsheets, so scalar fields are read
//! leniently: numbers and booleans become text, `"x"`/`"yes"`/`"true"` count
//! as set flags, and capitalized column names are accepted as aliases.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A fetched form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Field descriptors in insertion order
    pub data: Vec<FieldDescriptor>,
    /// Where and how to submit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionConfig>,
}

impl FormSchema {
    /// Parse a schema document
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the text is not JSON or has no
    /// `data` array.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Configured submission URL, if any
    #[must_use]
    pub fn submission_url(&self) -> Option<&str> {
        self.submission.as_ref()?.url.as_deref()
    }

    /// Configured confirmation (redirect) URL, if any
    #[must_use]
    pub fn confirmation(&self) -> Option<&str> {
        self.submission.as_ref()?.confirmation.as_deref()
    }
}

/// The `submission` block. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Endpoint receiving the `POST`
    #[serde(default, deserialize_with = "lenient::target", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Page to navigate to after a successful submission
    #[serde(default, deserialize_with = "lenient::target", skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
}

/// Kind of field a descriptor asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A text-like `input` with the given `type` (`text`, `email`, `tel`, ...)
    Text(String),
    /// One option of a radio group
    Radio,
    /// A checkbox
    Checkbox,
    /// The submit button
    Submit,
    /// A named group other fields can join through their `fieldset` key
    Fieldset,
    /// Anything else, by its type name (`textarea`, `select`, `heading`, ...)
    Other(String),
}

const TEXT_INPUT_TYPES: &[&str] = &[
    "text",
    "email",
    "tel",
    "number",
    "date",
    "datetime-local",
    "time",
    "month",
    "week",
    "password",
    "url",
    "search",
    "color",
    "range",
    "hidden",
    "file",
];

impl FieldKind {
    /// Classify a `type` value (case-insensitive; empty means `text`)
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "" => Self::Text("text".to_string()),
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            "submit" => Self::Submit,
            "fieldset" => Self::Fieldset,
            t if TEXT_INPUT_TYPES.contains(&t) => Self::Text(lowered),
            _ => Self::Other(lowered),
        }
    }

    /// The `type` string this kind was parsed from
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(t) | Self::Other(t) => t,
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Submit => "submit",
            Self::Fieldset => "fieldset",
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Text("text".to_string())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry of the schema's `data` list.
///
/// Keys the engine does not know about are kept in `extra` for custom
/// field factories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Control name (payload key)
    #[serde(default, alias = "Name", deserialize_with = "lenient::name")]
    pub name: String,
    /// Field kind
    #[serde(rename = "type", default, alias = "Type", deserialize_with = "lenient::kind")]
    pub kind: FieldKind,
    /// Visible label
    #[serde(default, alias = "Label", deserialize_with = "lenient::text")]
    pub label: Option<String>,
    /// Initial value
    #[serde(default, alias = "Value", deserialize_with = "lenient::text")]
    pub value: Option<String>,
    /// Placeholder text
    #[serde(default, alias = "Placeholder", deserialize_with = "lenient::text")]
    pub placeholder: Option<String>,
    /// Choices for `select` fields (array or comma-separated text)
    #[serde(default, alias = "Options", deserialize_with = "lenient::list")]
    pub options: Vec<String>,
    /// Whether a value is required
    #[serde(
        default,
        alias = "Required",
        alias = "Mandatory",
        alias = "mandatory",
        deserialize_with = "lenient::flag"
    )]
    pub required: bool,
    /// Initial checkedness for radios and checkboxes
    #[serde(default, alias = "Checked", deserialize_with = "lenient::flag")]
    pub checked: bool,
    /// Regular expression the whole value must match
    #[serde(default, alias = "Pattern", deserialize_with = "lenient::text")]
    pub pattern: Option<String>,
    /// Minimum value length
    #[serde(default, alias = "Minlength", deserialize_with = "lenient::text")]
    pub minlength: Option<String>,
    /// Maximum value length
    #[serde(default, alias = "Maxlength", deserialize_with = "lenient::text")]
    pub maxlength: Option<String>,
    /// Explicit element id
    #[serde(default, alias = "Id", deserialize_with = "lenient::text")]
    pub id: Option<String>,
    /// Name of the fieldset this field belongs to
    #[serde(default, alias = "Fieldset", deserialize_with = "lenient::text")]
    pub fieldset: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    /// Descriptor with just a name and kind
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }
}

mod lenient {
    use super::FieldKind;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?))
    }

    /// Blank targets count as absent.
    pub fn target<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        text(deserializer).map(|raw| raw.filter(|s| !s.trim().is_empty()))
    }

    pub fn name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        text(deserializer).map(Option::unwrap_or_default)
    }

    pub fn kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldKind, D::Error> {
        text(deserializer).map(|raw| FieldKind::parse(raw.as_deref().unwrap_or_default()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "x" | "yes" | "y" | "1" | "on" | "checked" | "required"
            ),
            _ => false,
        })
    }

    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(scalar).collect(),
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            other => scalar(other).into_iter().collect(),
        })
    }
}
