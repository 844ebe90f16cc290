//! Local cache backend behaviour

use bulwark_domain::ports::CacheBackend;
use bulwark_providers::cache::LocalCache;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_value_survives_within_ttl_and_expires_after() {
    let cache = LocalCache::new();
    cache
        .set("bulwark:user:1", json!("Ann"), Some(Duration::from_millis(200)))
        .await
        .unwrap();

    assert_eq!(cache.get("bulwark:user:1").await.unwrap(), Some(json!("Ann")));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.get("bulwark:user:1").await.unwrap(), None);
    assert!(!cache.exists("bulwark:user:1").await.unwrap());
}

#[tokio::test]
async fn test_overwrite_replaces_value_and_ttl() {
    let cache = LocalCache::new();
    cache
        .set("k", json!(1), Some(Duration::from_millis(20)))
        .await
        .unwrap();
    cache.set("k", json!(2), None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
}

#[tokio::test]
async fn test_pattern_delete_removes_exactly_the_matching_live_keys() {
    let cache = LocalCache::new();
    let keys = [
        "ns:report:2024:01",
        "ns:report:2024:02",
        "ns:report:2023:12",
        "ns:summary:2024",
    ];
    for key in keys {
        cache.set(key, json!(key), None).await.unwrap();
    }
    cache
        .set("ns:report:2024:03", json!("stale"), Some(Duration::from_millis(1)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let removed = cache.delete_matching("ns:report:2024:*").await.unwrap();
    assert_eq!(removed, 2);

    assert!(cache.exists("ns:report:2023:12").await.unwrap());
    assert!(cache.exists("ns:summary:2024").await.unwrap());
    assert!(!cache.exists("ns:report:2024:01").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_writers_do_not_lose_keys() {
    let cache = LocalCache::new();
    let mut handles = Vec::new();
    for task in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                cache
                    .set(&format!("t{task}:{i}"), json!(i), None)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(cache.len(), 400);
}
