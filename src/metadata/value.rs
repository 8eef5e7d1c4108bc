//! Typed cell values
//!
//! Metadata files carry plain JSON/YAML scalars for most values, which are
//! classified once here. Timestamps have no native JSON form and use the
//! tagged shape `{"type": "timestamp", "value": "2025-03-01T09:30:00"}`; the
//! other kinds accept the tagged shape too.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The value of a single cell, resolved at decode time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawValue", into = "RawValue")]
pub enum CellValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    /// Timezone-naive date and time
    Timestamp(NaiveDateTime),
    Text(String),
    /// A value of a kind the metadata model does not know, in textual form
    Other(String),
}

impl CellValue {
    /// Textual form used for numeric coercion and display
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) | CellValue::Other(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Float(_) => "float",
            CellValue::Integer(_) => "integer",
            CellValue::Boolean(_) => "boolean",
            CellValue::Timestamp(_) => "timestamp",
            CellValue::Text(_) => "string",
            CellValue::Other(_) => "other",
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Integer(i64::from(v))
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Boolean(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(v: NaiveDateTime) -> Self {
        CellValue::Timestamp(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum TaggedValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    String(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Tagged(TaggedValue),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<RawValue> for CellValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Tagged(TaggedValue::Float(v)) | RawValue::Float(v) => CellValue::Float(v),
            RawValue::Tagged(TaggedValue::Integer(v)) | RawValue::Integer(v) => {
                CellValue::Integer(v)
            }
            RawValue::Tagged(TaggedValue::Boolean(v)) | RawValue::Boolean(v) => {
                CellValue::Boolean(v)
            }
            RawValue::Tagged(TaggedValue::Timestamp(v)) => CellValue::Timestamp(v),
            RawValue::Tagged(TaggedValue::String(v)) | RawValue::Text(v) => CellValue::Text(v),
            RawValue::Other(v) => CellValue::Other(v.to_string()),
        }
    }
}

impl From<CellValue> for RawValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Float(v) => RawValue::Float(v),
            CellValue::Integer(v) => RawValue::Integer(v),
            CellValue::Boolean(v) => RawValue::Boolean(v),
            CellValue::Timestamp(v) => RawValue::Tagged(TaggedValue::Timestamp(v)),
            CellValue::Text(v) | CellValue::Other(v) => RawValue::Text(v),
        }
    }
}
