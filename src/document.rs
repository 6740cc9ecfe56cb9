//! The served unit of state: a normalized tabular document produced from an
//! uploaded spreadsheet export.
//!
//! A [`Document`] is decoded from the JSON artifact written by the document
//! producer, validated once, and from then on shared immutably through `Arc`.
//! It is replaced wholesale on each successful ingestion and never mutated.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::datatype::FieldType;
use crate::error::{BoardError, Result};

/// A single row. The source format has no fixed schema, so cells stay a
/// generic mapping; consumers look columns up through the resolver.
pub type Row = serde_json::Map<String, Value>;

pub type Meta = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub title: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Where the producer found the data, kept verbatim when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    #[serde(default)]
    pub data_sheet: String,
    #[serde(default)]
    pub filters_sheet: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "scalar_meta")]
    pub meta: Meta,
    pub dataset: Dataset,
    #[serde(default)]
    pub field_types: BTreeMap<String, FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl Document {
    /// Decode and validate a producer artifact.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Document = serde_json::from_slice(bytes)?;
        document.validate()?;
        Ok(document)
    }

    pub fn columns(&self) -> &[String] {
        &self.dataset.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.dataset.rows
    }

    pub fn title(&self) -> &str {
        &self.dataset.title
    }

    /// Checks the structural invariants: unique column names, every row key a
    /// declared column, and type tags only for declared columns.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.dataset.columns.len());
        for column in &self.dataset.columns {
            if !seen.insert(column.as_str()) {
                return Err(BoardError::corrupt(format!("duplicate column '{column}'")));
            }
        }
        for (index, row) in self.dataset.rows.iter().enumerate() {
            if let Some(key) = row.keys().find(|k| !seen.contains(k.as_str())) {
                return Err(BoardError::corrupt(format!(
                    "row {index} has undeclared column '{key}'"
                )));
            }
        }
        if let Some(key) = self.field_types.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(BoardError::corrupt(format!("type given for undeclared column '{key}'")));
        }
        Ok(())
    }
}

// Export metadata is string to string; the producer occasionally emits numbers.
fn scalar_meta<'de, D>(deserializer: D) -> std::result::Result<Meta, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}
