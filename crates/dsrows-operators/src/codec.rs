//! RowCodec: typed rows from untyped request parameters.
//!
//! Only `Value` columns take input. Each is read from the parameter named
//! `columnId_<id>` and coerced according to its `ValueKind` by one exhaustive
//! match, so a new kind cannot be added without deciding how it is coerced.

use dsrows_core::id::{ColumnId, MediaId};
use dsrows_core::schema::{ColumnKind, ColumnSchema, ValueKind};
use dsrows_core::types::{FieldValue, Row};

use crate::dates::DateService;
use crate::error::CodecError;
use crate::sanitize::{RawParams, Sanitizer};

/// Request parameter carrying the value for a column.
pub fn param_key(column_id: ColumnId) -> String {
    format!("columnId_{}", column_id.get())
}

pub struct RowCodec {
    dates: DateService,
}

impl RowCodec {
    pub fn new(dates: DateService) -> Self {
        Self { dates }
    }

    /// Build a new row from `params`. The returned row has no id.
    ///
    /// Fails without producing anything if any column is remote-sourced.
    pub fn build_for_insert(
        &self,
        columns: &[ColumnSchema],
        params: &RawParams,
    ) -> Result<Row, CodecError> {
        if columns.iter().any(|c| c.column_kind == ColumnKind::Remote) {
            return Err(CodecError::invalid(
                "cannot add rows to a remote-sourced dataset",
                "columnKind",
            ));
        }

        let sanitizer = Sanitizer::new(params);
        let mut row = Row::new();
        for column in columns.iter().filter(|c| c.is_value()) {
            let key = param_key(column.column_id);
            let value = self.coerce(column.value_kind, &sanitizer, &key);
            row.set(column.heading.clone(), value);
        }
        Ok(row)
    }

    /// Merge `params` over `existing`.
    ///
    /// Value columns without a parameter keep their stored value verbatim;
    /// non-value fields are carried over untouched.
    pub fn build_for_update(
        &self,
        columns: &[ColumnSchema],
        existing: &Row,
        params: &RawParams,
    ) -> Result<Row, CodecError> {
        if !columns.iter().any(|c| c.is_value()) {
            return Err(CodecError::invalid(
                "cannot edit remote column data",
                "columnKind",
            ));
        }

        let sanitizer = Sanitizer::new(params);
        let mut row = existing.clone();
        for column in columns.iter().filter(|c| c.is_value()) {
            let key = param_key(column.column_id);
            let Some(raw) = sanitizer.get_raw(&key) else {
                tracing::trace!(heading = %column.heading, "no parameter, keeping stored value");
                continue;
            };

            let value = match column.value_kind {
                // Parse the submitted value itself, then localize.
                ValueKind::Date => self
                    .dates
                    .parse(raw)
                    .map(|dt| FieldValue::Date(self.dates.local_date(dt)))
                    .unwrap_or(FieldValue::Null),
                kind => self.coerce(kind, &sanitizer, &key),
            };
            tracing::debug!(heading = %column.heading, ?value, "merged field");
            row.set(column.heading.clone(), value);
        }
        row.row_id = existing.row_id;
        Ok(row)
    }

    /// Coerce one parameter to the column's kind. Never fails.
    fn coerce(&self, kind: ValueKind, sanitizer: &Sanitizer<'_>, key: &str) -> FieldValue {
        match kind {
            ValueKind::String => sanitizer
                .get_string(key)
                .map(FieldValue::Str)
                .unwrap_or(FieldValue::Null),
            ValueKind::Number => sanitizer
                .get_double(key)
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            ValueKind::Date => sanitizer
                .get_date(key, &self.dates)
                .map(|dt| FieldValue::Date(self.dates.local_date(dt)))
                .unwrap_or(FieldValue::Null),
            ValueKind::Image => sanitizer
                .get_int(key)
                .and_then(|id| u64::try_from(id).ok())
                .map(|id| FieldValue::Image(MediaId::new(id)))
                .unwrap_or(FieldValue::Null),
        }
    }
}
