//! Store contracts used by the row controller.
//!
//! Invariants:
//! - Row ids are unique within a dataset and assigned by the store. An id is
//!   never handed out twice, even after the row holding it is deleted.
//! - Stores do their own locking; callers never coordinate concurrent edits.
//! - A failing call leaves earlier successful calls in place (no rollback).

use dsrows_core::id::{DataSetId, MediaId, RowId};
use dsrows_core::schema::DataSet;
use dsrows_core::types::{Media, Row};
use dsrows_operators::GridQuerySpec;

use crate::error::Result;

/// Which parts of a dataset a save persists.
///
/// `last_data_edit` is always merged and never moves backwards. `last_active`
/// belongs to [`DataSetCatalog::set_active`] and is never written by a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Run `DataSet::validate` before writing.
    pub validate: bool,
    /// Replace the stored column list.
    pub save_columns: bool,
    /// Replace name, description, owner and editors.
    pub save_details: bool,
}

impl SaveOptions {
    /// Bookkeeping save after a row mutation: only `last_data_edit` is written.
    pub const fn data_only() -> Self {
        Self {
            validate: false,
            save_columns: false,
            save_details: false,
        }
    }

    pub const fn full() -> Self {
        Self {
            validate: true,
            save_columns: true,
            save_details: true,
        }
    }
}

/// One page of grid results plus the unpaged match count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub total: u64,
}

pub trait DataSetCatalog: Send + Sync {
    fn get_by_id(&self, id: DataSetId) -> Result<DataSet>;

    fn save(&self, data_set: &DataSet, opts: SaveOptions) -> Result<()>;

    /// Record that the dataset was just viewed.
    fn set_active(&self, id: DataSetId) -> Result<()>;
}

pub trait DatasetRowStore: Send + Sync {
    fn query(&self, data_set: &DataSet, spec: &GridQuerySpec) -> Result<RowPage>;

    fn get_row(&self, data_set: &DataSet, row_id: RowId) -> Result<Option<Row>>;

    /// Insert and return the assigned id. Any id on `row` is ignored.
    fn insert(&self, data_set: &DataSet, row: Row) -> Result<RowId>;

    fn update(&self, data_set: &DataSet, row_id: RowId, row: Row) -> Result<()>;

    fn delete(&self, data_set: &DataSet, row_id: RowId) -> Result<()>;
}

pub trait MediaLibrary: Send + Sync {
    fn get_by_id(&self, id: MediaId) -> Result<Media>;
}

/// A store that provides every collaborator.
pub trait Backend: DataSetCatalog + DatasetRowStore + MediaLibrary {}

impl<T: DataSetCatalog + DatasetRowStore + MediaLibrary> Backend for T {}

/// Merge `incoming` into the stored dataset according to `opts`.
pub(crate) fn apply_save(stored: &mut DataSet, incoming: &DataSet, opts: SaveOptions) {
    if opts.save_details {
        stored.name = incoming.name.clone();
        stored.description = incoming.description.clone();
        stored.owner_id = incoming.owner_id;
        stored.editors = incoming.editors.clone();
    }
    if opts.save_columns {
        stored.columns = incoming.columns.clone();
    }
    stored.last_data_edit = stored.last_data_edit.max(incoming.last_data_edit);
}

/// Reject fields that do not name a column of `data_set`.
pub(crate) fn check_fields(data_set: &DataSet, row: &Row) -> Result<()> {
    for heading in row.fields.keys() {
        if data_set.column_by_heading(heading).is_none() {
            return Err(crate::error::StoreError::UnknownColumn(heading.clone()));
        }
    }
    Ok(())
}
