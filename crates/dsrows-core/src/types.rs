//! Row and field value representation shared by the codec, stores and controller.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::id::{MediaId, RowId};

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Null,
    Str(String),
    Number(f64),
    /// Local date/time rendered as `YYYY-MM-DD HH:MM:SS`.
    Date(String),
    Image(MediaId),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text used for substring matching. `Null` never matches.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Str(s) | FieldValue::Date(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Image(id) => Some(id.to_string()),
        }
    }

    pub fn as_media_id(&self) -> Option<MediaId> {
        match self {
            FieldValue::Image(id) => Some(*id),
            _ => None,
        }
    }

    /// Plain JSON rendering used in response payloads.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Str(s) | FieldValue::Date(s) => serde_json::Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Image(id) => serde_json::Value::from(id.get()),
        }
    }
}

/// Compare two field values for sorting.
///
/// Nulls are sorted first, then values are compared by type.
pub fn field_cmp(a: &FieldValue, b: &FieldValue) -> Ordering {
    use FieldValue::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Number(x), Number(y)) => {
            if x.is_nan() && y.is_nan() {
                Ordering::Equal
            } else if x.is_nan() {
                Ordering::Greater
            } else if y.is_nan() {
                Ordering::Less
            } else {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
        }
        (Str(x), Str(y)) => x.cmp(y),
        // ISO-local strings order chronologically.
        (Date(x), Date(y)) => x.cmp(y),
        (Image(x), Image(y)) => x.cmp(y),
        // Mixed types: order by variant order
        _ => type_order(a).cmp(&type_order(b)),
    }
}

fn type_order(v: &FieldValue) -> u8 {
    use FieldValue::*;
    match v {
        Null => 0,
        Number(_) => 1,
        Date(_) => 2,
        Str(_) => 3,
        Image(_) => 4,
    }
}

/// One record of a dataset. `row_id` is `None` until the store assigns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub row_id: Option<RowId>,
    /// Keyed by column heading.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(row_id: RowId) -> Self {
        Self {
            row_id: Some(row_id),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, heading: impl Into<String>, value: FieldValue) {
        self.fields.insert(heading.into(), value);
    }

    pub fn get(&self, heading: &str) -> Option<&FieldValue> {
        self.fields.get(heading)
    }

    /// Missing fields read as `Null`.
    pub fn get_or_null(&self, heading: &str) -> FieldValue {
        self.fields.get(heading).cloned().unwrap_or(FieldValue::Null)
    }

    /// Flat JSON object: `{"id": rowId, "<heading>": value, ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(id) = self.row_id {
            obj.insert("id".into(), serde_json::Value::from(id.get()));
        }
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(obj)
    }
}

/// A media library asset referenced by image columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub media_id: MediaId,
    pub name: String,
    #[serde(default)]
    pub stored_as: Option<String>,
}

/// Wall clock in epoch milliseconds, for bookkeeping timestamps.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
