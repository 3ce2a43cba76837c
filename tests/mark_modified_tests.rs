//! Row write followed by the data-only dataset save, with no rollback between.

mod test_data_gen;

use std::sync::Arc;

use dsrows_core::id::{DataSetId, RowId};
use dsrows_core::schema::DataSet;
use dsrows_core::types::Row;
use dsrows_exec::{ControllerError, RowController};
use dsrows_io::{
    DataSetCatalog, DatasetRowStore, MemoryDataSetStore, RowPage, SaveOptions, StoreError,
};
use dsrows_operators::{GridQuerySpec, RawParams};
use test_data_gen::{owner, params, people_data_set, test_config, PEOPLE};

/// Catalog whose saves and activity marks always fail.
struct ReadOnlyCatalog(Arc<MemoryDataSetStore>);

impl DataSetCatalog for ReadOnlyCatalog {
    fn get_by_id(&self, id: DataSetId) -> dsrows_io::Result<DataSet> {
        self.0.get_by_id(id)
    }

    fn save(&self, _data_set: &DataSet, _opts: SaveOptions) -> dsrows_io::Result<()> {
        Err(StoreError::Io("catalog is read-only".into()))
    }

    fn set_active(&self, _id: DataSetId) -> dsrows_io::Result<()> {
        Err(StoreError::Io("catalog is read-only".into()))
    }
}

fn controller_with_failing_catalog() -> (Arc<MemoryDataSetStore>, RowController) {
    let store = Arc::new(MemoryDataSetStore::new());
    store.insert_data_set(people_data_set());
    let controller = RowController::new(
        Arc::new(ReadOnlyCatalog(store.clone())),
        store.clone(),
        store.clone(),
        &test_config(),
    );
    (store, controller)
}

#[test]
fn test_failed_mark_modified_keeps_inserted_row() {
    let (store, controller) = controller_with_failing_catalog();

    let err = controller
        .add(&owner(), PEOPLE, &params(&[("columnId_1", "Alice")]))
        .unwrap_err();
    assert!(matches!(err, ControllerError::Store(_)));
    assert_eq!(err.http_status(), 500);

    // The row write already happened.
    assert_eq!(store.row_count(PEOPLE), 1);
    assert_eq!(store.get_by_id(PEOPLE).unwrap().last_data_edit, 0);
}

#[test]
fn test_failed_set_active_does_not_fail_grid() {
    let (_store, controller) = controller_with_failing_catalog();
    let state = controller.grid(&owner(), PEOPLE, &RawParams::new()).unwrap();
    assert_eq!(state.http_status, 200);
    assert_eq!(state.records_total, None);
    assert_eq!(state.message, None);
}

#[test]
fn test_mark_modified_does_not_touch_columns() {
    let store = Arc::new(MemoryDataSetStore::new());
    store.insert_data_set(people_data_set());
    let controller = RowController::with_backend(store.clone(), &test_config());

    controller
        .add(&owner(), PEOPLE, &params(&[("columnId_1", "Alice")]))
        .unwrap();
    let ds = store.get_by_id(PEOPLE).unwrap();
    assert!(ds.last_data_edit > 0);
    assert_eq!(ds.columns, people_data_set().columns);
}

/// Row store that records a grid view of the dataset while each insert runs,
/// landing between the controller's dataset load and its bookkeeping save.
struct ViewedDuringInsert(Arc<MemoryDataSetStore>);

impl DatasetRowStore for ViewedDuringInsert {
    fn query(&self, data_set: &DataSet, spec: &GridQuerySpec) -> dsrows_io::Result<RowPage> {
        self.0.query(data_set, spec)
    }

    fn get_row(&self, data_set: &DataSet, row_id: RowId) -> dsrows_io::Result<Option<Row>> {
        self.0.get_row(data_set, row_id)
    }

    fn insert(&self, data_set: &DataSet, row: Row) -> dsrows_io::Result<RowId> {
        self.0.set_active(data_set.data_set_id)?;
        self.0.insert(data_set, row)
    }

    fn update(&self, data_set: &DataSet, row_id: RowId, row: Row) -> dsrows_io::Result<()> {
        self.0.update(data_set, row_id, row)
    }

    fn delete(&self, data_set: &DataSet, row_id: RowId) -> dsrows_io::Result<()> {
        self.0.delete(data_set, row_id)
    }
}

#[test]
fn test_mark_modified_keeps_concurrent_activity_mark() {
    let store = Arc::new(MemoryDataSetStore::new());
    store.insert_data_set(people_data_set());
    let controller = RowController::new(
        store.clone(),
        Arc::new(ViewedDuringInsert(store.clone())),
        store.clone(),
        &test_config(),
    );

    controller
        .add(&owner(), PEOPLE, &params(&[("columnId_1", "Alice")]))
        .unwrap();
    let ds = store.get_by_id(PEOPLE).unwrap();
    assert!(ds.last_active > 0);
    assert!(ds.last_data_edit > 0);
}
