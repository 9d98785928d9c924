use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of value a custom field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Checkbox,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "checkbox" => Ok(FieldType::Checkbox),
            _ => Err(format!(
                "invalid field type '{s}' (expected text, number, checkbox)"
            )),
        }
    }
}

/// A custom field value. Serialized as a bare JSON string, number or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Checkbox(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// The type this value's shape corresponds to
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Checkbox(_) => FieldType::Checkbox,
        }
    }

    /// Zero value for a type: empty text, 0, unchecked
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => FieldValue::Text(String::new()),
            FieldType::Number => FieldValue::Number(0.0),
            FieldType::Checkbox => FieldValue::Checkbox(false),
        }
    }

    /// Parse user input as a value of the given type.
    ///
    /// An empty string yields [`FieldValue::empty`] for every type.
    pub fn parse(field_type: FieldType, input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(FieldValue::empty(field_type));
        }
        match field_type {
            FieldType::Text => Ok(FieldValue::Text(input.to_string())),
            FieldType::Number => input
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| format!("'{input}' is not a number")),
            FieldType::Checkbox => match input {
                "true" | "yes" | "1" | "on" => Ok(FieldValue::Checkbox(true)),
                "false" | "no" | "0" | "off" => Ok(FieldValue::Checkbox(false)),
                _ => Err(format!("'{input}' is not a checkbox value (true/false)")),
            },
        }
    }

    /// True for empty text. Numbers and checkboxes always carry a value.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    /// Total order used for sorting custom-field columns.
    /// Values of different types order by type (text, number, checkbox).
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => compare_text(a, b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Checkbox(a), FieldValue::Checkbox(b)) => a.cmp(b),
            _ => type_rank(self).cmp(&type_rank(other)),
        }
    }
}

fn type_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Text(_) => 0,
        FieldValue::Number(_) => 1,
        FieldValue::Checkbox(_) => 2,
    }
}

/// Case-insensitive comparison with a case-sensitive tiebreak, so that
/// `"apple" < "Banana"` while still producing a total order.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Checkbox(b) => write!(f, "{b}"),
        }
    }
}

/// Schema entry for a custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Value every task receives when the field is registered or a task is created
    #[serde(alias = "value")]
    pub default_value: FieldValue,
}

impl CustomFieldDefinition {
    /// Build a definition whose type follows the default value's shape
    pub fn new(name: impl Into<String>, default_value: FieldValue) -> Self {
        CustomFieldDefinition {
            name: name.into(),
            field_type: default_value.field_type(),
            default_value,
        }
    }

    /// Build a definition with the empty default for `field_type`
    pub fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
        CustomFieldDefinition {
            name: name.into(),
            field_type,
            default_value: FieldValue::empty(field_type),
        }
    }

    /// The value a task carries for this field when first seeded
    pub fn seed_value(&self) -> CustomFieldValue {
        CustomFieldValue {
            name: self.name.clone(),
            field_type: self.field_type,
            value: self.default_value.clone(),
        }
    }
}

/// A custom field value attached to one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: FieldValue,
}

impl CustomFieldValue {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        CustomFieldValue {
            name: name.into(),
            field_type: value.field_type(),
            value,
        }
    }

    /// Whether the value's runtime shape matches the declared type
    pub fn is_consistent(&self) -> bool {
        self.value.field_type() == self.field_type
    }
}
