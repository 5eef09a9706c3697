// tests/dedup_store.rs
use chrono::{TimeZone, Utc};
use job_feed_notifier::{DedupSet, DedupStore, JsonFileStore, PersistenceError};

#[tokio::test]
async fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nope.json"));
    let set = store.load().await.expect("missing state is not an error");
    assert!(set.is_empty());
    assert!(set.last_updated().is_none());
}

#[tokio::test]
async fn persist_then_load_round_trips_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("posted_jobs.json"));

    let mut set: DedupSet = ["1800000000000000002", "1800000000000000001"]
        .into_iter()
        .collect();
    set.touch(Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap());
    store.persist(&set).await.unwrap();

    let back = store.load().await.unwrap();
    assert_eq!(back, set);

    // on-disk shape: posted_ids sorted, ISO-8601 timestamp
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(
        raw["posted_ids"],
        serde_json::json!(["1800000000000000001", "1800000000000000002"])
    );
    assert_eq!(raw["last_updated"], "2025-09-06T09:00:00Z");
}

#[tokio::test]
async fn persisting_a_loaded_set_keeps_the_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("posted_jobs.json"));
    let set: DedupSet = ["a", "b", "c"].into_iter().collect();
    store.persist(&set).await.unwrap();

    let loaded = store.load().await.unwrap();
    store.persist(&loaded).await.unwrap();
    let again = store.load().await.unwrap();

    let ids: Vec<&str> = again.ids().collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn persist_replaces_prior_contents_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posted_jobs.json");
    let store = JsonFileStore::new(&path);

    store
        .persist(&["old"].into_iter().collect())
        .await
        .unwrap();
    store
        .persist(&["new"].into_iter().collect())
        .await
        .unwrap();

    let set = store.load().await.unwrap();
    assert!(set.contains("new"));
    assert!(!set.contains("old"));

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["posted_jobs.json".to_string()]);
}

#[tokio::test]
async fn creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state").join("nested").join("ids.json"));
    store.persist(&DedupSet::new()).await.unwrap();
    assert!(store.path().exists());
}

#[tokio::test]
async fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posted_jobs.json");
    std::fs::write(&path, "[1,2,").unwrap();

    let err = JsonFileStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, PersistenceError::Corrupt { .. }), "{err}");
}

#[tokio::test]
async fn reads_state_written_by_the_previous_bot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posted_jobs.json");
    std::fs::write(
        &path,
        r#"{
  "posted_ids": [1834567890123456789, 1834567890123456790],
  "last_updated": "2025-09-06T10:15:42.512301"
}"#,
    )
    .unwrap();

    let set = JsonFileStore::new(&path).load().await.unwrap();
    assert!(set.contains("1834567890123456789"));
    assert!(set.contains("1834567890123456790"));
    assert!(set.last_updated().is_some());
}

#[tokio::test]
async fn unwritable_target_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // parent "directory" is a regular file
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let store = JsonFileStore::new(blocker.join("posted_jobs.json"));

    let err = store.persist(&DedupSet::new()).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Io { .. }), "{err}");
}
