//! Convenient re-exports for downstream crates.

pub use crate::config::{Collation, ServiceConfig};
pub use crate::error::{Error, Result};
pub use crate::id::{ColumnId, DataSetId, MediaId, RowId, UserId};
pub use crate::schema::{ColumnKind, ColumnSchema, DataSet, ValueKind};
pub use crate::types::{FieldValue, Media, Row};
