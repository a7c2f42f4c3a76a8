//! Integration tests for the read-through cache façade.

mod common;

use common::{MemoryDriver, SqliteCache};
use kickcache_core::CacheError;
use kickcache_repository::NoopCacheDriver;
use kickcache_service::cache_keys::{MATCH_INFO, SEARCH, TRANSFERS};
use kickcache_service::{generate_key, Cache, CacheOutcome, Namespace, NamespaceRegistry};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

#[derive(Debug)]
enum ApiError {
    Upstream(String),
    Cache(CacheError),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

fn registry() -> NamespaceRegistry {
    let mut registry = NamespaceRegistry::with_defaults();
    let mapping = json!({ "MATCH_INFO": "1m", "TRANSFERS": "12h" });
    registry.apply_extra_ttl(mapping.as_object().unwrap()).unwrap();
    registry
}

fn namespace(name: &str) -> Namespace {
    registry().get(name).unwrap().clone()
}

async fn fetch_counting(
    cache: &Cache,
    namespace: &Namespace,
    key: &str,
    calls: &AtomicUsize,
) -> Result<CacheOutcome, ApiError> {
    cache
        .cache_func(namespace, key, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("payload-{key}").into_bytes())
        })
        .await
}

#[tokio::test]
async fn test_miss_then_hit() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(MATCH_INFO);
    let calls = AtomicUsize::new(0);

    let first = fetch_counting(&db.cache, &ns, "123", &calls).await.unwrap();
    assert!(!first.hit);
    assert!(first.stored);
    assert_eq!(first.value, b"payload-123");

    let second = fetch_counting(&db.cache, &ns, "123", &calls).await.unwrap();
    assert!(second.hit);
    assert!(!second.stored);
    assert_eq!(second.value, b"payload-123");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    db.cache.close().await.unwrap();
}

#[tokio::test]
async fn test_fetch_error_stores_nothing() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(SEARCH);

    let result = db
        .cache
        .cache_func(&ns, "messi", || async {
            Err::<Vec<u8>, _>(ApiError::Upstream("429 Too Many Requests".into()))
        })
        .await;
    match result {
        Err(ApiError::Upstream(message)) => assert_eq!(message, "429 Too Many Requests"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(db.cache.len().await.unwrap(), 0);

    let calls = AtomicUsize::new(0);
    let outcome = fetch_counting(&db.cache, &ns, "messi", &calls).await.unwrap();
    assert!(!outcome.hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    db.cache.close().await.unwrap();
}

#[tokio::test]
async fn test_noop_driver_always_fetches() {
    let cache = Cache::new(Arc::new(NoopCacheDriver::new())).await.unwrap();
    let ns = namespace(MATCH_INFO);
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let outcome = fetch_counting(&cache, &ns, "1", &calls).await.unwrap();
        assert!(!outcome.hit);
        assert!(!outcome.stored);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    cache.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_misses_both_fetch() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(TRANSFERS);
    let barrier = Barrier::new(2);
    let calls = AtomicUsize::new(0);

    let call = |body: &'static str| {
        let cache = Arc::clone(&db.cache);
        let ns = ns.clone();
        let barrier = &barrier;
        let calls = &calls;
        async move {
            cache
                .cache_func::<_, _, ApiError>(&ns, "tr-2024", || async move {
                    // both callers have missed before either stores
                    barrier.wait().await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(body.as_bytes().to_vec())
                })
                .await
        }
    };

    let (a, b) = tokio::join!(call("a"), call("b"));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!a.hit && !b.hit);
    assert_eq!(a.value, b"a");
    assert_eq!(b.value, b"b");
    assert!(a.stored ^ b.stored);

    let winner = if a.stored { a.value } else { b.value };
    assert_eq!(db.cache.select(&ns, "tr-2024").await.unwrap(), Some(winner));
    db.cache.close().await.unwrap();
}

#[derive(Serialize)]
struct Standing {
    team: &'static str,
    points: u32,
}

#[tokio::test]
async fn test_cache_func_json_serializes() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(MATCH_INFO);
    let key = generate_key(&["super-lig", "2024"]);

    let outcome = db
        .cache
        .cache_func_json::<_, _, _, ApiError>(&ns, &key, || async {
            Ok(vec![Standing { team: "GS", points: 99 }])
        })
        .await
        .unwrap();
    assert_eq!(outcome.value, br#"[{"team":"GS","points":99}]"#);
    assert!(outcome.stored);

    let cached = db
        .cache
        .cache_func_json::<Vec<Standing>, _, _, ApiError>(&ns, &key, || async {
            Err(ApiError::Upstream("should have been cached".into()))
        })
        .await
        .unwrap();
    assert!(cached.hit);
    assert_eq!(cached.value, outcome.value);
    db.cache.close().await.unwrap();
}

#[tokio::test]
async fn test_extra_ttl_delays_expiry() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(MATCH_INFO);

    assert!(db.cache.insert(&ns, "42", b"v").await.unwrap());

    db.clock.set(1_059);
    assert!(db.cache.select_expired(0).await.unwrap().is_empty());

    db.clock.set(1_060);
    assert_eq!(db.cache.select_expired(0).await.unwrap(), vec!["442".to_string()]);
    db.cache.close().await.unwrap();
}

#[tokio::test]
async fn test_insert_select_delete_roundtrip() {
    let db = SqliteCache::new(1_000).await;
    let ns = namespace(SEARCH);

    assert!(db.cache.insert(&ns, "ronaldo", b"first").await.unwrap());
    assert!(!db.cache.insert(&ns, "ronaldo", b"second").await.unwrap());
    assert_eq!(
        db.cache.select(&ns, "ronaldo").await.unwrap().as_deref(),
        Some(&b"first"[..])
    );

    assert!(db.cache.delete(&ns, "ronaldo").await.unwrap());
    assert!(!db.cache.delete(&ns, "ronaldo").await.unwrap());
    assert!(db.cache.is_empty().await.unwrap());
    db.cache.close().await.unwrap();
}

#[tokio::test]
async fn test_drop_without_close_closes_driver_once() {
    let driver = Arc::new(MemoryDriver::new());
    let cache = Cache::new(driver.clone()).await.unwrap();

    drop(cache);
    for _ in 0..100 {
        if driver.closes() > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_close_then_drop_closes_driver_once() {
    let driver = Arc::new(MemoryDriver::new());
    let cache = Cache::new(driver.clone()).await.unwrap();

    cache.close().await.unwrap();
    cache.close().await.unwrap();
    drop(cache);
    tokio::task::yield_now().await;

    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_ping_times_out() {
    let driver = Arc::new(MemoryDriver::with_ping_delay(Duration::from_millis(500)));
    let cache = Cache::new(driver).await.unwrap();

    let err = cache.ping(Duration::from_millis(10)).await.unwrap_err();
    assert!(matches!(err, CacheError::Timeout(_)));
    cache.close().await.unwrap();
}

#[tokio::test]
async fn test_insert_records_extra_ttl_date() {
    let driver = Arc::new(MemoryDriver::new());
    let clock = Arc::new(kickcache_core::FixedClock::new(2_000));
    let cache = Cache::with_clock(driver.clone(), clock).await.unwrap();

    cache.insert(&namespace(TRANSFERS), "x", b"v").await.unwrap();
    cache.insert(&namespace(SEARCH), "x", b"v").await.unwrap();

    assert_eq!(driver.date_of("7x"), Some(2_000 + 12 * 3600));
    assert_eq!(driver.date_of("9x"), Some(2_000));
    cache.close().await.unwrap();
}
