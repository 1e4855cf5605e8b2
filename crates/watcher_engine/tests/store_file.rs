use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use watcher_core::NotifiedSet;
use watcher_engine::{FileStore, StateStore, StoreError};

fn set(ids: &[&str]) -> NotifiedSet {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn missing_document_loads_as_empty_set() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("searches.json"));

    let notified = store.load("roomba").await.expect("load ok");
    assert!(notified.is_empty());
}

#[tokio::test]
async fn save_then_load_survives_a_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("searches.json");

    let store = FileStore::new(path.clone());
    store.save("roomba", &set(&["a", "b"])).await.expect("save ok");
    drop(store);

    // A fresh store instance stands in for a restarted process.
    let restarted = FileStore::new(path);
    let notified = restarted.load("roomba").await.expect("load ok");
    assert_eq!(notified, set(&["a", "b"]));
}

#[tokio::test]
async fn unknown_term_in_existing_document_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("searches.json"));
    store.save("roomba", &set(&["a"])).await.expect("save ok");

    let notified = store.load("velo").await.expect("load ok");
    assert!(notified.is_empty());
}

#[tokio::test]
async fn save_preserves_other_terms_in_the_document() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("searches.json"));

    store.save("roomba", &set(&["a"])).await.expect("save ok");
    store.save("velo", &set(&["x", "y"])).await.expect("save ok");

    assert_eq!(store.load("roomba").await.expect("load ok"), set(&["a"]));
    assert_eq!(store.load("velo").await.expect("load ok"), set(&["x", "y"]));
}

#[tokio::test]
async fn corrupt_document_is_reported_unavailable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("searches.json");
    fs::write(&path, "{ this is not json").unwrap();

    let store = FileStore::new(path);
    let err = store.load("roomba").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn save_over_corrupt_document_recovers() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("searches.json");
    fs::write(&path, "garbage").unwrap();

    let store = FileStore::new(path);
    store.save("roomba", &set(&["a"])).await.expect("save ok");
    assert_eq!(store.load("roomba").await.expect("load ok"), set(&["a"]));
}

#[tokio::test]
async fn redundant_save_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("searches.json"));
    let notified = set(&["a", "b"]);

    store.save("roomba", &notified).await.expect("save ok");
    store.save("roomba", &notified).await.expect("save ok");

    assert_eq!(store.load("roomba").await.expect("load ok"), notified);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_saves_for_different_terms_keep_both() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path().join("searches.json")));

    // Two terms share one document; neither read-modify-write may clobber
    // the other's entry.
    let roomba = {
        let store = store.clone();
        tokio::spawn(async move { store.save("roomba", &set(&["a", "b"])).await })
    };
    let velo = {
        let store = store.clone();
        tokio::spawn(async move { store.save("velo", &set(&["x"])).await })
    };
    roomba.await.unwrap().expect("save ok");
    velo.await.unwrap().expect("save ok");

    assert_eq!(store.load("roomba").await.expect("load ok"), set(&["a", "b"]));
    assert_eq!(store.load("velo").await.expect("load ok"), set(&["x"]));
}

#[tokio::test]
async fn failed_save_leaves_no_document_behind() {
    let temp = TempDir::new().unwrap();
    // Parent "directory" is a plain file, so the write cannot proceed.
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let store = FileStore::new(blocker.join("searches.json"));
    let err = store.save("roomba", &set(&["a"])).await.unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)));
}

#[tokio::test]
async fn document_parent_directory_is_created_on_save() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("data").join("searches.json");

    let store = FileStore::new(nested.clone());
    store.save("roomba", &set(&["a"])).await.expect("save ok");
    assert!(nested.is_file());
}
