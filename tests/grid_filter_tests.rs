//! Grid filtering, sorting and paging through the controller.

mod test_data_gen;

use std::sync::Arc;

use dsrows_core::config::{Collation, ServiceConfig};
use dsrows_core::schema::{ColumnSchema, ValueKind};
use dsrows_exec::RowController;
use dsrows_io::MemoryDataSetStore;
use dsrows_operators::{GridQueryBuilder, RawParams};
use serde_json::Value;
use test_data_gen::{memory_controller, owner, params, people_data_set, test_config, PEOPLE};

fn seed(controller: &RowController) {
    for (name, age) in [
        ("Paris Hilton", "40"),
        ("Lyon King", "12"),
        ("parker", "33"),
        ("Nina", "28"),
        ("Sparrow", "51"),
    ] {
        controller
            .add(&owner(), PEOPLE, &params(&[("columnId_1", name), ("columnId_2", age)]))
            .unwrap();
    }
}

fn names(data: &Value) -> Vec<String> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|r| r["Name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_builder_single_clause_has_no_join_artifacts() {
    let cols = vec![ColumnSchema::value(1, "city", ValueKind::String)];
    let spec = GridQueryBuilder::default().build_from_params(&cols, &params(&[("city", "par")]));
    assert_eq!(spec.filter.to_string(), "city LIKE '%par%'");

    let empty = GridQueryBuilder::default().build_from_params(&cols, &RawParams::new());
    assert!(empty.filter.is_empty());
}

#[test]
fn test_substring_filter_is_case_insensitive_by_default() {
    let (_store, controller) = memory_controller();
    seed(&controller);

    let state = controller
        .grid(&owner(), PEOPLE, &params(&[("Name", "par"), ("order", "Name")]))
        .unwrap();
    assert_eq!(state.records_total, Some(3));
    assert_eq!(
        names(state.data.as_ref().unwrap()),
        vec!["Paris Hilton", "Sparrow", "parker"]
    );
}

#[test]
fn test_case_sensitive_collation() {
    let store = Arc::new(MemoryDataSetStore::new());
    store.insert_data_set(people_data_set());
    let cfg = ServiceConfig {
        collation: Collation::CaseSensitive,
        ..test_config()
    };
    let controller = RowController::with_backend(store, &cfg);
    seed(&controller);

    let state = controller
        .grid(&owner(), PEOPLE, &params(&[("Name", "par")]))
        .unwrap();
    assert_eq!(state.records_total, Some(2));
}

#[test]
fn test_sort_and_paging() {
    let (_store, controller) = memory_controller();
    seed(&controller);

    let state = controller
        .grid(
            &owner(),
            PEOPLE,
            &params(&[("order", "Age DESC, Unknown"), ("start", "1"), ("length", "2")]),
        )
        .unwrap();
    assert_eq!(state.records_total, Some(5));
    assert_eq!(
        names(state.data.as_ref().unwrap()),
        vec!["Paris Hilton", "parker"]
    );
}

#[test]
fn test_garbage_paging_means_everything() {
    let (_store, controller) = memory_controller();
    seed(&controller);

    let state = controller
        .grid(&owner(), PEOPLE, &params(&[("start", "x"), ("length", "-1")]))
        .unwrap();
    assert_eq!(state.data.unwrap().as_array().map(Vec::len), Some(5));
}

#[test]
fn test_filter_override_replaces_column_filters() {
    let (_store, controller) = memory_controller();
    seed(&controller);

    let state = controller
        .grid(
            &owner(),
            PEOPLE,
            &params(&[("Name", "par"), ("filter", "AND Name LIKE 'Nin%'")]),
        )
        .unwrap();
    assert_eq!(names(state.data.as_ref().unwrap()), vec!["Nina"]);
}

#[test]
fn test_broken_override_degrades_to_empty_page() {
    let (_store, controller) = memory_controller();
    seed(&controller);

    let state = controller
        .grid(&owner(), PEOPLE, &params(&[("filter", "Name = 'x")]))
        .unwrap();
    assert_eq!(state.http_status, 200);
    assert_eq!(state.data, Some(Value::Array(Vec::new())));
    assert!(state
        .message
        .unwrap()
        .starts_with("Error getting DataSet data, failed with following message: "));
}
