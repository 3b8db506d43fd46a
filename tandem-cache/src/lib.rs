//! # Tandem Cache
//!
//! Memoizing wrappers. A wrapped function is called once per distinct key;
//! later calls with an equal key get the stored result back.
//!
//! The key is computed from the whole argument value, by default through
//! `serde_json`, so `(5,)` is stored under `[5]`. Entries live until they are
//! cleared explicitly.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod error;

pub use error::CacheError;

/// Signature of a key function as a plain fn pointer.
pub type KeyFn<A> = fn(&A) -> Result<String, CacheError>;

/// Default key: structural JSON serialization of the arguments.
pub fn structural_key<A: Serialize + ?Sized>(args: &A) -> Result<String, CacheError> {
    Ok(serde_json::to_string(args)?)
}

/// Memoize a synchronous function.
pub fn cache<A, R, F>(func: F) -> Cache<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(&A) -> R,
{
    Cache::new(func)
}

/// Memoize an async function. The stored value is whatever the function's
/// future resolved with.
pub fn cache_async<A, R, F, Fut>(func: F) -> AsyncCache<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
{
    AsyncCache::new(func)
}

// ════════════════════════════════════════════════════════════════════
// Store
// ════════════════════════════════════════════════════════════════════

struct Store<R> {
    entries: Mutex<HashMap<String, R>>,
}

impl<R: Clone> Store<R> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A panic inside a wrapped function never happens under the lock, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, R>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &str) -> Option<R> {
        self.lock().get(key).cloned()
    }

    fn insert(&self, key: String, value: R) {
        self.lock().insert(key, value);
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn remove<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = self.lock();
        for key in keys {
            entries.remove(key.as_ref());
        }
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

// ════════════════════════════════════════════════════════════════════
// Sync
// ════════════════════════════════════════════════════════════════════

pub struct Cache<A, R, F, K = KeyFn<A>> {
    func: F,
    key: K,
    store: Store<R>,
    _args: std::marker::PhantomData<fn(&A)>,
}

impl<A, R, F> Cache<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(&A) -> R,
{
    pub fn new(func: F) -> Self {
        Self::with_key(func, structural_key::<A>)
    }
}

impl<A, R, F, K> Cache<A, R, F, K>
where
    R: Clone,
    F: Fn(&A) -> R,
    K: Fn(&A) -> Result<String, CacheError>,
{
    pub fn with_key(func: F, key: K) -> Self {
        Self {
            func,
            key,
            store: Store::new(),
            _args: std::marker::PhantomData,
        }
    }

    /// Returns the stored value for `args`, computing it on the first call.
    /// The store is not locked while `func` runs.
    pub fn call(&self, args: &A) -> Result<R, CacheError> {
        let key = (self.key)(args)?;
        if let Some(hit) = self.store.lookup(&key) {
            tracing::trace!(%key, "cache hit");
            return Ok(hit);
        }

        tracing::trace!(%key, "cache miss");
        let value = (self.func)(args);
        self.store.insert(key, value.clone());
        Ok(value)
    }

    pub fn key_for(&self, args: &A) -> Result<String, CacheError> {
        (self.key)(args)
    }

    /// Drops every entry.
    pub fn clear(&self) -> &Self {
        self.store.clear();
        self
    }

    /// Drops only the given keys.
    pub fn clear_keys<I, S>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.remove(keys);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A, R, F, K> std::fmt::Debug for Cache<A, R, F, K>
where
    R: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.store.len())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════
// Async
// ════════════════════════════════════════════════════════════════════

/// Concurrent misses on the same key are not merged: each one runs the
/// wrapped function, and the last to finish leaves its value in the store.
pub struct AsyncCache<A, R, F, K = KeyFn<A>> {
    func: F,
    key: K,
    store: Store<R>,
    _args: std::marker::PhantomData<fn(A)>,
}

impl<A, R, F, Fut> AsyncCache<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
{
    pub fn new(func: F) -> Self {
        Self::with_key(func, structural_key::<A>)
    }
}

impl<A, R, F, Fut, K> AsyncCache<A, R, F, K>
where
    R: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
    K: Fn(&A) -> Result<String, CacheError>,
{
    pub fn with_key(func: F, key: K) -> Self {
        Self {
            func,
            key,
            store: Store::new(),
            _args: std::marker::PhantomData,
        }
    }

    /// A hit resolves on the first poll without touching `func`.
    pub async fn call(&self, args: A) -> Result<R, CacheError> {
        let key = (self.key)(&args)?;
        if let Some(hit) = self.store.lookup(&key) {
            tracing::trace!(%key, "async cache hit");
            return Ok(hit);
        }

        tracing::trace!(%key, "async cache miss");
        let value = (self.func)(args).await;
        self.store.insert(key, value.clone());
        Ok(value)
    }

    pub fn key_for(&self, args: &A) -> Result<String, CacheError> {
        (self.key)(args)
    }

    pub fn clear(&self) -> &Self {
        self.store.clear();
        self
    }

    pub fn clear_keys<I, S>(&self, keys: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.remove(keys);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A, R, F, K> std::fmt::Debug for AsyncCache<A, R, F, K>
where
    R: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCache")
            .field("entries", &self.store.len())
            .finish()
    }
}
