//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use dsrows_core::prelude::{
    ColumnId, ColumnKind, ColumnSchema, DataSet, DataSetId, ServiceConfig, UserId, ValueKind,
};
use dsrows_exec::{Caller, RowController};
use dsrows_io::MemoryDataSetStore;
use dsrows_operators::RawParams;

pub const PEOPLE: DataSetId = DataSetId::new(1);
pub const OWNER: UserId = UserId::new(1);
pub const EDITOR: UserId = UserId::new(2);
pub const STRANGER: UserId = UserId::new(3);

/// Name (string), Age (number), Joined (date), Photo (image).
pub fn people_data_set() -> DataSet {
    let mut ds = DataSet::new(PEOPLE, "People", OWNER).with_columns(vec![
        ColumnSchema::value(1, "Name", ValueKind::String),
        ColumnSchema::value(2, "Age", ValueKind::Number),
        ColumnSchema::value(3, "Joined", ValueKind::Date),
        ColumnSchema::value(4, "Photo", ValueKind::Image),
    ]);
    ds.editors.push(EDITOR);
    ds
}

pub fn remote_data_set(id: DataSetId) -> DataSet {
    DataSet::new(id, "Feed", OWNER).with_columns(vec![
        ColumnSchema::value(1, "Title", ValueKind::String),
        ColumnSchema::new(ColumnId::new(2), "Source", ColumnKind::Remote, ValueKind::String),
    ])
}

/// UTC so stored dates are predictable.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        tz_offset_minutes: Some(0),
        ..ServiceConfig::default()
    }
}

pub fn memory_controller() -> (Arc<MemoryDataSetStore>, RowController) {
    let store = Arc::new(MemoryDataSetStore::new());
    store.insert_data_set(people_data_set());
    let controller = RowController::with_backend(store.clone(), &test_config());
    (store, controller)
}

pub fn owner() -> Caller {
    Caller::user(OWNER)
}

pub fn stranger() -> Caller {
    Caller::user(STRANGER)
}

pub fn params(pairs: &[(&str, &str)]) -> RawParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Fresh per-test directory under the system temp dir.
pub fn create_temp_data_dir(name: &str) -> String {
    let mut dir = std::env::temp_dir();
    dir.push(format!("dsrows-tests-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir.to_string_lossy().to_string()
}
