//! Integration tests for the SQLite cache store and the aggregate cache

use std::cell::Cell;

use recipe_insights::cache::AggregateCache;
use recipe_insights::db::{Database, SaveMode, TableStore};
use recipe_insights::table::{Column, Table, Value};
use tempfile::tempdir;

fn open_store(dir: &tempfile::TempDir) -> Database {
    let path = dir.path().join("database").join("streamlit.db");
    Database::new(&path.to_string_lossy()).expect("Failed to open store")
}

fn mixed_table() -> Table {
    Table::from_columns(vec![
        Column::new("Year", vec![2005_i64, 2006]),
        Column::new("Proportion", vec![Value::Real(50.0), Value::Null]),
        Column::new("Cuisine", vec!["italian", "greek"]),
    ])
    .expect("valid table")
}

#[test]
fn test_store_creates_parent_directory() {
    let dir = tempdir().expect("Failed to create temp directory");
    let _db = open_store(&dir);
    assert!(dir.path().join("database").is_dir());
}

#[test]
fn test_round_trip_preserves_names_order_and_types() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db = open_store(&dir);

    db.save("cuisine_data", &mixed_table(), SaveMode::Replace).expect("save");
    let loaded = db.load("cuisine_data").expect("table present");

    assert_eq!(loaded.column_names(), vec!["Year", "Proportion", "Cuisine"]);
    assert_eq!(loaded.get(0, "Year"), Some(&Value::Integer(2005)));
    assert_eq!(loaded.get(0, "Proportion"), Some(&Value::Real(50.0)));
    assert_eq!(loaded.get(1, "Proportion"), Some(&Value::Null));
    assert_eq!(loaded.get(1, "Cuisine"), Some(&Value::from("greek")));
}

#[test]
fn test_store_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp directory");
    open_store(&dir)
        .save("rating_evolution", &mixed_table(), SaveMode::Replace)
        .expect("save");

    let reopened = open_store(&dir);
    assert!(reopened.exists_and_nonempty("rating_evolution"));
    assert_eq!(reopened.load("rating_evolution"), Some(mixed_table()));
}

#[test]
fn test_missing_table_is_not_an_error() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db = open_store(&dir);
    assert!(!db.exists_and_nonempty("oils_dataframe"));
    assert!(db.load("oils_dataframe").is_none());
}

#[test]
fn test_clear_cache_empties_store() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db = open_store(&dir);
    db.save("top_tags", &mixed_table(), SaveMode::Replace).expect("save");
    db.save("cuisine_data", &mixed_table(), SaveMode::Replace).expect("save");
    assert_eq!(db.list_tables().expect("list"), vec!["cuisine_data", "top_tags"]);

    assert_eq!(db.clear().expect("clear"), 2);
    assert!(db.list_tables().expect("list").is_empty());
    assert!(db.load("top_tags").is_none());
}

#[test]
fn test_memoized_aggregate_computes_once() {
    let dir = tempdir().expect("Failed to create temp directory");
    let cache = AggregateCache::new(open_store(&dir));
    let calls = Cell::new(0);

    for _ in 0..3 {
        let table = cache.get_or_compute("quick_recipe_proportion_table", || {
            calls.set(calls.get() + 1);
            mixed_table()
        });
        assert_eq!(table, mixed_table());
    }

    assert_eq!(calls.get(), 1);
    assert_eq!(cache.metrics().cache_misses(), 1);
    assert_eq!(cache.metrics().cache_hits(), 2);
    assert!(cache.store().exists_and_nonempty("quick_recipe_proportion_table"));
}

#[test]
fn test_memoization_survives_new_cache_instance() {
    let dir = tempdir().expect("Failed to create temp directory");
    let first = AggregateCache::new(open_store(&dir));
    first.get_or_compute("cuisine_data", mixed_table);

    let second = AggregateCache::new(open_store(&dir));
    let table = second.get_or_compute("cuisine_data", || panic!("must be served from the store"));
    assert_eq!(table, mixed_table());
}
