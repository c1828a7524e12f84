//! Two store handles opened on the same database file behave like two
//! service instances sharing one cache store.

use std::time::Duration;

use llmbench_kv::{KeyValueStore, LibsqlKeyValueStore};

async fn two_instances() -> (tempfile::TempDir, LibsqlKeyValueStore, LibsqlKeyValueStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let first = LibsqlKeyValueStore::new_local(&path).await.unwrap();
    let second = LibsqlKeyValueStore::new_local(&path).await.unwrap();
    (dir, first, second)
}

#[tokio::test]
async fn writes_are_visible_to_other_instances() {
    let (_dir, first, second) = two_instances().await;

    first
        .set("benchmarks:metric:ttft", r#"{"ttft":[]}"#, None)
        .await
        .unwrap();

    assert!(second.exists("benchmarks:metric:ttft").await.unwrap());
    assert!(second.delete("benchmarks:metric:ttft").await.unwrap());
    assert!(!first.exists("benchmarks:metric:ttft").await.unwrap());
}

#[tokio::test]
async fn only_one_instance_wins_set_if_absent() {
    let (_dir, first, second) = two_instances().await;
    let ttl = Duration::from_secs(120);

    assert!(first.set_if_absent("retry:lock", "first", ttl).await.unwrap());
    assert!(!second.set_if_absent("retry:lock", "second", ttl).await.unwrap());

    // The loser cannot release a token it does not hold.
    assert!(!second.delete_if_equals("retry:lock", "second").await.unwrap());
    assert!(first.delete_if_equals("retry:lock", "first").await.unwrap());

    assert!(second.set_if_absent("retry:lock", "second", ttl).await.unwrap());
}
