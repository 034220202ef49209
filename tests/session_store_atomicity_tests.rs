//! Concurrency and crash-resilience tests for `JsonSessionStore`, at the
//! integration level (hitting real files through `tokio::fs`, not just the
//! in-crate unit tests).

use garde::model::SessionState;
use garde::session::{JsonSessionStore, LoadOutcome, SessionStore};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_concurrent_saves_leave_one_complete_valid_file() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonSessionStore::new(dir.path().join("session.json")));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut state = SessionState::new(chrono::Utc::now());
            state.completed_pattern_ids.push(format!("writer-{i}"));
            store.save(&state).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Whichever writer's rename landed last, the file must be one complete,
    // valid session — never a half-written interleaving of two writers.
    match store.load().await {
        LoadOutcome::Present(state) => {
            assert_eq!(state.completed_pattern_ids.len(), 1);
            assert!(state.completed_pattern_ids[0].starts_with("writer-"));
        }
        LoadOutcome::Absent(failure) => panic!("expected a valid session, got {failure:?}"),
    }

    // No leftover temp siblings from the atomic-write dance.
    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut count = 0;
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 1, "only the target session file should remain");
}

#[tokio::test]
async fn test_save_after_corrupted_orphan_tmp_still_succeeds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = JsonSessionStore::new(path.clone());

    let mut state = SessionState::new(chrono::Utc::now());
    state.completed_pattern_ids.push("p1".to_string());
    store.save(&state).await.unwrap();

    // Simulate a crash between temp-file write and rename: leave an orphan
    // sibling behind, as `atomic_write` would momentarily create.
    let orphan = dir.path().join(".session.json.deadbeef.tmp");
    tokio::fs::write(&orphan, b"incomplete").await.unwrap();

    // The real session file is untouched and still loads correctly.
    match store.load().await {
        LoadOutcome::Present(loaded) => assert_eq!(loaded.completed_pattern_ids, vec!["p1".to_string()]),
        LoadOutcome::Absent(failure) => panic!("expected a valid session, got {failure:?}"),
    }

    // A subsequent save still succeeds and overwrites cleanly.
    state.completed_pattern_ids.push("p2".to_string());
    store.save(&state).await.unwrap();
    match store.load().await {
        LoadOutcome::Present(loaded) => assert_eq!(loaded.completed_pattern_ids.len(), 2),
        LoadOutcome::Absent(failure) => panic!("expected a valid session, got {failure:?}"),
    }
}
