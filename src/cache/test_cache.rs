//! In-memory [`CacheClient`] used by the crate's tests.
//!
//! Counts every call, remembers the options it was handed, and can be told to
//! fail reads, writes, or its readiness check.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use thiserror::Error;

use super::{BoxFuture, CacheClient};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TestCacheError {
    #[error("cache unavailable")]
    Unavailable,

    #[error("read failed for key {0}")]
    Read(String),

    #[error("write failed for key {0}")]
    Write(String),
}

pub(crate) struct TestCache<V = String> {
    entries: Mutex<HashMap<String, V>>,
    last_options: Mutex<Option<String>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_check: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<V> TestCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            last_options: Mutex::new(None),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            fail_check: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(crate) fn seeded<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let cache = Self::new();
        cache.entries.lock().unwrap().extend(entries);
        cache
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub(crate) fn last_options(&self) -> Option<String> {
        self.last_options.lock().unwrap().clone()
    }

    /// Simulates expiry of a single key.
    pub(crate) fn expire(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub(crate) fn fail_check(&self) {
        self.fail_check.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Yields until at least `n` writes have been attempted.
    ///
    /// Detached writes run on spawned tasks, so tests that inspect the cache
    /// after a miss wait here first.
    pub(crate) async fn wait_for_sets(&self, n: usize) {
        for _ in 0..200 {
            if self.set_calls() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("expected {n} cache writes, saw {}", self.set_calls());
    }
}

impl<V: Clone> TestCache<V> {
    pub(crate) fn entry(&self, key: &str) -> Option<V> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

impl<V> CacheClient for TestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Key = String;
    type Value = V;
    type Options = String;
    type Error = TestCacheError;

    fn get<'a>(&'a self, key: &'a String) -> BoxFuture<'a, Result<Option<V>, TestCacheError>> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(TestCacheError::Read(key.clone()));
            }
            Ok(self.entry(key))
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a String,
        value: V,
        options: &'a String,
    ) -> BoxFuture<'a, Result<(), TestCacheError>> {
        Box::pin(async move {
            self.sets.fetch_add(1, Ordering::SeqCst);
            *self.last_options.lock().unwrap() = Some(options.clone());
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TestCacheError::Write(key.clone()));
            }
            self.entries.lock().unwrap().insert(key.clone(), value);
            Ok(())
        })
    }

    fn check(&self) -> Result<(), TestCacheError> {
        if self.fail_check.load(Ordering::SeqCst) {
            Err(TestCacheError::Unavailable)
        } else {
            Ok(())
        }
    }
}
