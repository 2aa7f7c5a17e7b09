//! Integration tests for the watch list on a real database file
//!
//! Each "run" opens a fresh `SqliteStore` on the same path, the way the
//! binary does on every start.

use std::path::Path;

use tempfile::TempDir;

use weatherwatch::data::City;
use weatherwatch::store::{KvStore, SqliteStore};
use weatherwatch::watchlist::{Commit, Origin, WatchListError, WatchListManager, WATCH_LIST_KEY};

fn manager(path: &Path) -> WatchListManager<SqliteStore> {
    WatchListManager::new(SqliteStore::open(path))
}

fn keys(cities: &[City]) -> Vec<&str> {
    cities.iter().map(|city| city.key.as_str()).collect()
}

#[tokio::test]
async fn test_first_run_seeds_and_second_run_restores() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("watch.sqlite3");

    let first = manager(&db).load().await;
    assert_eq!(first.origin, Origin::Seeded);
    assert_eq!(first.cities, vec![City::new("newyork", "New York, NY")]);

    let second = manager(&db).load().await;
    assert_eq!(second.origin, Origin::Persisted);
    assert_eq!(second.cities, first.cities);
}

#[tokio::test]
async fn test_changes_survive_restart_in_order() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("watch.sqlite3");

    {
        let mut list = manager(&db);
        list.load().await;
        assert_eq!(list.add(City::new("sf", "San Francisco")).await, Ok(Commit::Durable));
        assert_eq!(list.add(City::new("austin", "Austin, TX")).await, Ok(Commit::Durable));
        assert_eq!(list.remove("newyork").await, Commit::Durable);
    }

    let mut restarted = manager(&db);
    let loaded = restarted.load().await;
    assert_eq!(loaded.origin, Origin::Persisted);
    assert_eq!(keys(&loaded.cities), vec!["sf", "austin"]);
    assert_eq!(restarted.get("sf").map(|c| c.label.as_str()), Some("San Francisco"));
}

#[tokio::test]
async fn test_duplicate_add_leaves_stored_list_untouched() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("watch.sqlite3");

    let mut list = manager(&db);
    list.load().await;
    let before = SqliteStore::open(&db).get(WATCH_LIST_KEY).await.unwrap();

    let result = list.add(City::new("newyork", "Somewhere else")).await;

    assert_eq!(result, Err(WatchListError::DuplicateKey("newyork".to_string())));
    let after = SqliteStore::open(&db).get(WATCH_LIST_KEY).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_removing_everything_persists_an_empty_list() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("watch.sqlite3");

    let mut list = manager(&db);
    list.load().await;
    assert_eq!(list.remove("newyork").await, Commit::Durable);

    // An empty stored list is not the same as no stored list: no reseeding
    let loaded = manager(&db).load().await;
    assert_eq!(loaded.origin, Origin::Persisted);
    assert!(loaded.cities.is_empty());
}

#[tokio::test]
async fn test_stored_record_is_json_array_of_key_label() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("watch.sqlite3");

    let mut list = manager(&db);
    list.load().await;
    list.add(City::new("sf", "San Francisco")).await.unwrap();

    let bytes = SqliteStore::open(&db)
        .get(WATCH_LIST_KEY)
        .await
        .unwrap()
        .expect("record should exist");
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            {"key": "newyork", "label": "New York, NY"},
            {"key": "sf", "label": "San Francisco"}
        ])
    );
}

#[tokio::test]
async fn test_unopenable_database_keeps_session_in_memory() {
    let dir = TempDir::new().unwrap();
    // A regular file where the database's parent directory should be
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let mut list = manager(&blocker.join("watch.sqlite3"));
    let loaded = list.load().await;
    assert_eq!(loaded.origin, Origin::Memory);
    assert!(loaded.cities.is_empty());

    assert_eq!(list.add(City::new("sf", "San Francisco")).await, Ok(Commit::Ephemeral));
    assert_eq!(keys(list.cities()), vec!["sf"]);
    assert!(!list.is_durable());
}
