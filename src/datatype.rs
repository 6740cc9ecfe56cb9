// used to print out readable forms of a field type
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, Row};

/// Placeholder shown wherever a value is missing or not numeric.
pub const PLACEHOLDER: &str = "—";

/// Semantic type of a column, as tagged by the document producer.
///
/// The tag is trusted rather than re-derived from cell values. Tags this
/// crate does not know about degrade to [`FieldType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Percent,
    Number,
    Text,
}

impl FieldType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "percent" => Self::Percent,
            "number" => Self::Number,
            _ => Self::Text,
        }
    }
    /// The tag written back out; text keeps the producer's `string` spelling.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Number => "number",
            Self::Text => "string",
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.tag().to_owned()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Type of `column` in `document`; untagged columns render as text.
pub fn classify(document: &Document, column: &str) -> FieldType {
    document.field_types.get(column).copied().unwrap_or(FieldType::Text)
}

/// Safe numeric coercion. Empty strings, nulls, missing cells, non-numeric
/// text and non-finite numbers all yield `None`, never zero.
pub fn safe_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Numeric value of `column` in `row`, absent when the column or cell is.
pub fn cell_number(row: &Row, column: Option<&str>) -> Option<f64> {
    column.and_then(|c| row.get(c)).and_then(safe_number)
}

/// Text of a cell, `None` for missing, null and blank cells.
pub fn cell_text(row: &Row, column: Option<&str>) -> Option<String> {
    let text = match column.and_then(|c| row.get(c))? {
        Value::String(s) => s.trim().to_owned(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

pub fn format_percent(value: &Value) -> String {
    match safe_number(value) {
        Some(n) => format!("{n:.1}%"),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Scores of 100 and above are shown without decimals.
pub fn format_score(value: &Value) -> String {
    match safe_number(value) {
        Some(n) if n >= 100.0 => format!("{n:.0}"),
        Some(n) => format!("{n:.1}"),
        None => PLACEHOLDER.to_owned(),
    }
}

pub fn format_number(value: &Value) -> String {
    match safe_number(value) {
        Some(n) => format!("{n}"),
        None => PLACEHOLDER.to_owned(),
    }
}

pub fn format_text(value: &Value) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_owned(),
        Value::String(s) if s.is_empty() => PLACEHOLDER.to_owned(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Display string for a cell according to its column type.
pub fn format_cell(value: Option<&Value>, field_type: FieldType) -> String {
    let value = value.unwrap_or(&Value::Null);
    match field_type {
        FieldType::Percent => format_percent(value),
        FieldType::Number => format_number(value),
        FieldType::Text => format_text(value),
    }
}
