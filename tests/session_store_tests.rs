//! Plain integration-level coverage for `JsonSessionStore`'s save/load/
//! discard contract, distinct from `session_store_atomicity_tests.rs`'s
//! concurrency/crash-resilience focus.

use garde::model::{AliasAddition, SessionState};
use garde::session::{JsonSessionStore, LoadFailure, LoadOutcome, SessionStore};
use tempfile::tempdir;

#[tokio::test]
async fn test_full_lifecycle_across_multiple_runs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    // Run 1: nothing saved yet.
    let store = JsonSessionStore::new(path.clone());
    assert!(matches!(store.load().await, LoadOutcome::Absent(LoadFailure::Missing)));

    // Run 1 makes progress and persists.
    let mut state = SessionState::new(chrono::Utc::now());
    state.completed_pattern_ids.push("p1".to_string());
    state.created_food_ids.push("f1".to_string());
    state.alias_additions.push(AliasAddition {
        food_id: "f1".to_string(),
        alias: "courgette".to_string(),
    });
    store.save(&state).await.unwrap();

    // Run 2, a fresh `JsonSessionStore` instance pointed at the same path,
    // picks up exactly what run 1 left behind.
    let store2 = JsonSessionStore::new(path.clone());
    let loaded = match store2.load().await {
        LoadOutcome::Present(s) => s,
        LoadOutcome::Absent(f) => panic!("expected a present session, got {f:?}"),
    };
    assert_eq!(loaded.completed_pattern_ids, vec!["p1".to_string()]);
    assert_eq!(loaded.created_food_ids, vec!["f1".to_string()]);
    assert_eq!(loaded.alias_additions.len(), 1);

    // Run 2 makes further progress on top of the resumed state.
    let mut state2 = loaded;
    state2.completed_pattern_ids.push("p2".to_string());
    store2.save(&state2).await.unwrap();

    let store3 = JsonSessionStore::new(path.clone());
    let loaded2 = match store3.load().await {
        LoadOutcome::Present(s) => s,
        LoadOutcome::Absent(f) => panic!("expected a present session, got {f:?}"),
    };
    assert_eq!(loaded2.completed_pattern_ids, vec!["p1".to_string(), "p2".to_string()]);

    // Operator discards the session; the next run starts fresh again.
    store3.discard().await.unwrap();
    let store4 = JsonSessionStore::new(path);
    assert!(matches!(store4.load().await, LoadOutcome::Absent(LoadFailure::Missing)));
}

#[tokio::test]
async fn test_discard_on_an_already_missing_session_is_not_an_error() {
    let dir = tempdir().unwrap();
    let store = JsonSessionStore::new(dir.path().join("never-written.json"));
    store.discard().await.unwrap();
}

#[tokio::test]
async fn test_session_file_parent_directory_is_created_if_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config").join("session.json");
    let store = JsonSessionStore::new(path.clone());

    store.save(&SessionState::new(chrono::Utc::now())).await.unwrap();

    assert!(path.exists());
}
