use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tandem_cache::{AsyncCache, Cache, CacheError, cache, cache_async, structural_key};

// ============================================================================
// Key Tests
// ============================================================================

#[test]
fn test_structural_key_matches_json_array() {
    assert_eq!(structural_key(&(5,)).unwrap(), "[5]");
    assert_eq!(structural_key(&("a", 1, true)).unwrap(), r#"["a",1,true]"#);
}

#[test]
fn test_structural_key_rejects_non_string_map_keys() {
    let mut args = HashMap::new();
    args.insert((1, 2), "point");
    let err = structural_key(&args).unwrap_err();
    assert!(matches!(err, CacheError::Key(_)));
    assert!(err.to_string().contains("failed to serialize cache key"));
}

// ============================================================================
// Sync Cache Tests
// ============================================================================

#[test]
fn test_cache_calls_function_once_per_key() {
    let calls = AtomicUsize::new(0);
    let wrapped = cache(|(n,): &(u32,)| {
        calls.fetch_add(1, Ordering::SeqCst);
        n * 10
    });

    assert_eq!(wrapped.call(&(5,)).unwrap(), 50);
    assert_eq!(wrapped.call(&(5,)).unwrap(), 50);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(wrapped.call(&(6,)).unwrap(), 60);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(wrapped.len(), 2);
}

#[test]
fn test_cache_clear_forces_recompute() {
    let calls = AtomicUsize::new(0);
    let wrapped = cache(|(n,): &(u32,)| {
        // Distinct result per invocation.
        n * 100 + calls.fetch_add(1, Ordering::SeqCst) as u32
    });

    let first = wrapped.call(&(5,)).unwrap();
    assert_eq!(wrapped.call(&(5,)).unwrap(), first);

    let second = wrapped.clear().call(&(5,)).unwrap();
    assert_ne!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cache_clear_keys_removes_only_those() {
    let wrapped = Cache::new(|(n,): &(i64,)| n + 1);
    wrapped.call(&(1,)).unwrap();
    wrapped.call(&(2,)).unwrap();
    wrapped.call(&(3,)).unwrap();

    let key = wrapped.key_for(&(2,)).unwrap();
    assert_eq!(key, "[2]");
    wrapped.clear_keys([key.as_str(), "[3]"]);

    assert!(wrapped.contains_key("[1]"));
    assert!(!wrapped.contains_key("[2]"));
    assert!(!wrapped.contains_key("[3]"));
    assert_eq!(wrapped.len(), 1);
}

#[test]
fn test_cache_clear_with_no_keys_is_noop() {
    let wrapped = Cache::new(|(n,): &(i64,)| n + 1);
    wrapped.call(&(1,)).unwrap();
    wrapped.clear_keys(Vec::<String>::new());
    assert_eq!(wrapped.len(), 1);
    wrapped.clear();
    assert!(wrapped.is_empty());
}

#[test]
fn test_cache_custom_key_function() {
    let calls = AtomicUsize::new(0);
    // Case-insensitive key: "Hello" and "HELLO" share an entry.
    let wrapped = Cache::with_key(
        |word: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            word.len()
        },
        |word: &String| Ok(word.to_lowercase()),
    );

    assert_eq!(wrapped.call(&"Hello".to_string()).unwrap(), 5);
    assert_eq!(wrapped.call(&"HELLO".to_string()).unwrap(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(wrapped.contains_key("hello"));
}

#[test]
fn test_cache_custom_key_rejection_skips_function() {
    let calls = AtomicUsize::new(0);
    let wrapped = Cache::with_key(
        |n: &i32| {
            calls.fetch_add(1, Ordering::SeqCst);
            *n
        },
        |n: &i32| {
            if *n < 0 {
                Err(CacheError::Rejected(format!("negative: {}", n)))
            } else {
                Ok(n.to_string())
            }
        },
    );

    let err = wrapped.call(&-1).unwrap_err();
    assert!(err.to_string().contains("negative"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cache_serialization_failure_surfaces() {
    let wrapped = Cache::new(|args: &HashMap<(i32, i32), i32>| args.len());
    let mut args = HashMap::new();
    args.insert((0, 0), 1);
    assert!(matches!(wrapped.call(&args), Err(CacheError::Key(_))));
    assert!(wrapped.is_empty());
}

#[test]
fn test_cache_debug() {
    let wrapped = Cache::new(|(n,): &(i32,)| *n);
    wrapped.call(&(1,)).unwrap();
    let debug = format!("{:?}", wrapped);
    assert!(debug.contains("Cache"));
    assert!(debug.contains("entries: 1"));
}

// ============================================================================
// Async Cache Tests
// ============================================================================

#[tokio::test]
async fn test_async_cache_calls_function_once() {
    let calls = AtomicUsize::new(0);
    let wrapped = cache_async(|(n,): (u32,)| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            (n, n * 2)
        }
    });

    assert_eq!(wrapped.call((4,)).await.unwrap(), (4, 8));
    assert_eq!(wrapped.call((4,)).await.unwrap(), (4, 8));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(wrapped.contains_key("[4]"));
}

#[tokio::test]
async fn test_async_cache_hit_resolves_immediately() {
    let wrapped = AsyncCache::new(|(n,): (u32,)| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        n + 1
    });
    wrapped.call((1,)).await.unwrap();

    // A miss would have to wait on the timer; a hit is ready on first poll.
    let hit = wrapped.call((1,)).now_or_never();
    assert_eq!(hit.map(|r| r.unwrap()), Some(2));

    let miss = wrapped.call((2,)).now_or_never();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_async_cache_clear_forces_recompute() {
    let calls = AtomicUsize::new(0);
    let wrapped = AsyncCache::new(|(name,): (String,)| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { name.to_uppercase() }
    });

    wrapped.call(("tile".to_string(),)).await.unwrap();
    wrapped.clear();
    wrapped.call(("tile".to_string(),)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    wrapped.clear_keys([r#"["tile"]"#]);
    assert!(wrapped.is_empty());
}

#[tokio::test]
async fn test_async_cache_concurrent_misses_both_run() {
    let calls = AtomicUsize::new(0);
    let wrapped = AsyncCache::new(|(n,): (u32,)| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            n
        }
    });

    let (a, b) = tokio::join!(wrapped.call((9,)), wrapped.call((9,)));
    assert_eq!(a.unwrap(), 9);
    assert_eq!(b.unwrap(), 9);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(wrapped.len(), 1);
}

#[tokio::test]
async fn test_async_cache_custom_key() {
    let wrapped = AsyncCache::with_key(
        |url: String| async move { url.len() },
        |url: &String| Ok(url.trim_end_matches('/').to_string()),
    );
    assert_eq!(wrapped.call("http://a/".to_string()).await.unwrap(), 9);
    assert_eq!(wrapped.call("http://a".to_string()).await.unwrap(), 9);
    assert_eq!(wrapped.key_for(&"http://a/".to_string()).unwrap(), "http://a");
    assert_eq!(wrapped.len(), 1);
}
