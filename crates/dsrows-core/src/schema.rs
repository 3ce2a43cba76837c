//! Column schemas and the dataset aggregate that owns them. Pure data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{ColumnId, DataSetId, UserId};

/// Where a column's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Accepts direct input.
    Value,
    /// Derived; never accepts input.
    Formula,
    /// Sourced from an external feed; read-only for row mutation.
    Remote,
}

impl ColumnKind {
    /// Map the legacy numeric column type codes (1 value, 2 formula, 3 remote).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ColumnKind::Value),
            2 => Some(ColumnKind::Formula),
            3 => Some(ColumnKind::Remote),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" | "1" => Some(ColumnKind::Value),
            "formula" | "2" => Some(ColumnKind::Formula),
            "remote" | "3" => Some(ColumnKind::Remote),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Declared type of a column's values; drives input coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Date,
    /// Reference to a media library asset.
    Image,
}

impl ValueKind {
    /// Map the legacy numeric data type codes.
    ///
    /// Code 4 (external image URL) is stored as plain text, so it maps to
    /// `String`; only library images (5) carry a media reference.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 | 4 => Some(ValueKind::String),
            2 => Some(ValueKind::Number),
            3 => Some(ValueKind::Date),
            5 => Some(ValueKind::Image),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "string" | "text" | "url" => Some(ValueKind::String),
            "number" | "float" | "double" => Some(ValueKind::Number),
            "date" | "datetime" => Some(ValueKind::Date),
            "image" | "media" | "library image" => Some(ValueKind::Image),
            other => other.parse::<u8>().ok().and_then(Self::from_code),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub column_id: ColumnId,
    /// Field key in every row of the dataset.
    pub heading: String,
    pub column_kind: ColumnKind,
    pub value_kind: ValueKind,
    /// Optional comma separated list of allowed values, used by the forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_content: Option<String>,
    #[serde(default)]
    pub column_order: u32,
}

impl ColumnSchema {
    pub fn new(
        column_id: ColumnId,
        heading: impl Into<String>,
        column_kind: ColumnKind,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            column_id,
            heading: heading.into(),
            column_kind,
            value_kind,
            list_content: None,
            column_order: 0,
        }
    }

    pub fn value(column_id: u64, heading: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(ColumnId::new(column_id), heading, ColumnKind::Value, value_kind)
    }

    pub fn is_value(&self) -> bool {
        self.column_kind == ColumnKind::Value
    }
}

/// A user-defined table: identity, ownership and its column schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    pub data_set_id: DataSetId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: UserId,
    /// Users other than the owner that were granted edit.
    #[serde(default)]
    pub editors: Vec<UserId>,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    /// Epoch millis of the last row mutation.
    #[serde(default)]
    pub last_data_edit: u64,
    /// Epoch millis of the last grid view.
    #[serde(default)]
    pub last_active: u64,
}

impl DataSet {
    pub fn new(data_set_id: DataSetId, name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            data_set_id,
            name: name.into(),
            description: None,
            owner_id,
            editors: Vec::new(),
            columns: Vec::new(),
            last_data_edit: 0,
            last_active: 0,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnSchema>) -> Self {
        self.columns = columns;
        self
    }

    /// Columns in display order.
    pub fn columns(&self) -> Vec<&ColumnSchema> {
        let mut cols: Vec<&ColumnSchema> = self.columns.iter().collect();
        cols.sort_by_key(|c| (c.column_order, c.column_id));
        cols
    }

    pub fn column_by_heading(&self, heading: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.heading == heading)
    }

    pub fn next_column_id(&self) -> ColumnId {
        let max = self.columns.iter().map(|c| c.column_id.get()).max();
        ColumnId::new(max.map_or(1, |m| m + 1))
    }

    /// Append a column, assigning its order after the existing ones.
    pub fn add_column(&mut self, mut column: ColumnSchema) -> Result<()> {
        if column.heading.trim().is_empty() {
            return Err(Error::Schema("column heading must not be empty".into()));
        }
        if self.column_by_heading(&column.heading).is_some() {
            return Err(Error::Schema(format!(
                "duplicate column heading '{}'",
                column.heading
            )));
        }
        if self.columns.iter().any(|c| c.column_id == column.column_id) {
            return Err(Error::Schema(format!(
                "duplicate column id {}",
                column.column_id
            )));
        }
        if column.column_order == 0 {
            column.column_order = self.columns.iter().map(|c| c.column_order).max().unwrap_or(0) + 1;
        }
        self.columns.push(column);
        Ok(())
    }

    /// Structural checks run when a dataset is saved with validation enabled.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Schema("dataset name must not be empty".into()));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if col.heading.trim().is_empty() {
                return Err(Error::Schema(format!(
                    "column {} has an empty heading",
                    col.column_id
                )));
            }
            if self.columns[..i].iter().any(|c| c.heading == col.heading) {
                return Err(Error::Schema(format!(
                    "duplicate column heading '{}'",
                    col.heading
                )));
            }
        }
        Ok(())
    }
}
