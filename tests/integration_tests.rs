//! End-to-end row lifecycle through the controller.

mod test_data_gen;

use std::sync::Arc;

use dsrows_core::id::{DataSetId, RowId};
use dsrows_core::schema::{ColumnSchema, ValueKind};
use dsrows_core::types::FieldValue;
use dsrows_exec::{ControllerError, RowController};
use dsrows_io::{DataSetCatalog, DatasetRowStore, FsDataSetStore, SaveOptions};
use dsrows_operators::RawParams;
use test_data_gen::{create_temp_data_dir, memory_controller, owner, params, test_config, PEOPLE};

#[test]
fn test_add_edit_delete_lifecycle() {
    let (store, controller) = memory_controller();

    let added = controller
        .add(&owner(), PEOPLE, &params(&[("columnId_1", "Alice")]))
        .expect("add");
    assert_eq!(added.http_status, 201);
    let row_id = added.id.expect("id");
    assert_eq!(added.data, Some(serde_json::json!({ "id": row_id.get() })));

    let ds = store.get_by_id(PEOPLE).unwrap();
    let before = store.get_row(&ds, row_id).unwrap().expect("row stored");
    assert_eq!(before.get("Name"), Some(&FieldValue::Str("Alice".into())));
    assert_eq!(before.get("Age"), Some(&FieldValue::Null));

    let edited = controller
        .edit(&owner(), PEOPLE, row_id, &RawParams::new())
        .expect("edit");
    assert_eq!(edited.http_status, 200);
    assert_eq!(edited.id, Some(row_id));
    let after = store.get_row(&ds, row_id).unwrap().unwrap();
    assert_eq!(after, before);

    let deleted = controller.delete(&owner(), PEOPLE, row_id).expect("delete");
    assert_eq!(deleted.http_status, 204);
    assert_eq!(deleted.message.as_deref(), Some("Deleted Row"));

    let err = controller.edit_form(&owner(), PEOPLE, row_id).unwrap_err();
    assert!(matches!(err, ControllerError::NotFound(_)));
    let err = controller.delete(&owner(), PEOPLE, row_id).unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[test]
fn test_edit_missing_row_is_not_found() {
    let (store, controller) = memory_controller();
    let err = controller
        .edit(&owner(), PEOPLE, RowId::new(77), &params(&[("columnId_1", "x")]))
        .unwrap_err();
    assert!(matches!(err, ControllerError::NotFound(_)));
    assert_eq!(store.mutation_count(), 0);
}

#[test]
fn test_stale_edit_after_delete_does_not_hit_new_row() {
    let (store, controller) = memory_controller();
    let add = |name: &str| {
        controller
            .add(&owner(), PEOPLE, &params(&[("columnId_1", name)]))
            .expect("add")
            .id
            .expect("id")
    };

    add("Alice");
    let bob = add("Bob");
    controller.delete(&owner(), PEOPLE, bob).expect("delete");
    let carol = add("Carol");
    assert_ne!(carol, bob);

    let err = controller
        .edit(&owner(), PEOPLE, bob, &params(&[("columnId_1", "Mallory")]))
        .unwrap_err();
    assert!(matches!(err, ControllerError::NotFound(_)));

    let ds = store.get_by_id(PEOPLE).unwrap();
    let stored = store.get_row(&ds, carol).unwrap().expect("row stored");
    assert_eq!(stored.get("Name"), Some(&FieldValue::Str("Carol".into())));
}

#[test]
fn test_coercion_through_controller() {
    let (store, controller) = memory_controller();
    let added = controller
        .add(
            &owner(),
            PEOPLE,
            &params(&[
                ("columnId_1", " <i>Bob</i> "),
                ("columnId_2", "forty"),
                ("columnId_3", "2024-05-06T07:08:09Z"),
                ("columnId_4", "not-an-id"),
            ]),
        )
        .unwrap();

    let ds = store.get_by_id(PEOPLE).unwrap();
    let row = store.get_row(&ds, added.id.unwrap()).unwrap().unwrap();
    assert_eq!(row.get("Name"), Some(&FieldValue::Str("Bob".into())));
    assert_eq!(row.get("Age"), Some(&FieldValue::Number(0.0)));
    assert_eq!(
        row.get("Joined"),
        Some(&FieldValue::Date("2024-05-06 07:08:09".into()))
    );
    assert_eq!(row.get("Photo"), Some(&FieldValue::Null));
}

#[test]
fn test_filesystem_backend_lifecycle() {
    let dir = create_temp_data_dir("lifecycle");
    let store = Arc::new(FsDataSetStore::new(&dir));

    let mut ds = store
        .create_data_set("Menu", test_data_gen::OWNER)
        .expect("create");
    ds.add_column(ColumnSchema::value(1, "Dish", ValueKind::String))
        .unwrap();
    ds.add_column(ColumnSchema::value(2, "Price", ValueKind::Number))
        .unwrap();
    store.save(&ds, SaveOptions::full()).unwrap();

    let controller = RowController::with_backend(store.clone(), &test_config());
    let id: DataSetId = ds.data_set_id;
    for (dish, price) in [("Soup", "4.5"), ("Salad", "6"), ("Stew", "9")] {
        controller
            .add(&owner(), id, &params(&[("columnId_1", dish), ("columnId_2", price)]))
            .unwrap();
    }

    let grid = controller
        .grid(&owner(), id, &params(&[("Dish", "s"), ("order", "Price DESC")]))
        .unwrap();
    assert_eq!(grid.records_total, Some(3));
    let rows = grid.data.unwrap();
    assert_eq!(rows[0]["Dish"], "Stew");

    controller
        .edit(&owner(), id, RowId::new(1), &params(&[("columnId_2", "5")]))
        .unwrap();
    let reopened = FsDataSetStore::new(&dir);
    let ds = reopened.get_by_id(id).unwrap();
    assert!(ds.last_data_edit > 0);
    assert!(ds.last_active > 0);
    let soup = reopened.get_row(&ds, RowId::new(1)).unwrap().unwrap();
    assert_eq!(soup.get("Price"), Some(&FieldValue::Number(5.0)));
    assert_eq!(soup.get("Dish"), Some(&FieldValue::Str("Soup".into())));

    let _ = std::fs::remove_dir_all(&dir);
}
