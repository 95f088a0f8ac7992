//! Memoized functions — cache-aside wrappers around async computations.
//!
//! A [`Memoized`] function derives a key from its arguments, asks the cache
//! for it, and only runs the wrapped computation on a miss. The fresh result
//! is written back best-effort and returned to the caller untouched.
//!
//! ## Core types
//!
//! - [`MemoizerBuilder`] — validates configuration and resolves the cache.
//! - [`Memoized`] — the cloneable memoized entry point.
//! - [`MemoizedFn`] — a type-erased function value produced by
//!   [`Memoized::into_fn`].
//! - [`Computation`] — implemented by every `Fn(A) -> impl Future` closure.
//! - [`WriteMode`] — whether a cache write is awaited or spawned.
//!
//! ## Concurrency
//!
//! Invocations are independent. Two concurrent calls that miss on the same
//! key both run the computation and both write; which write survives is up to
//! the cache backend.

mod builder;
mod stats;

use std::{fmt, future::Future, sync::Arc};

use tracing::{debug, warn};

use crate::cache::{BoxFuture, CacheClient};

pub use builder::{BoxError, ConfigError, MemoizerBuilder};
pub use stats::StatsSnapshot;

use stats::Stats;

type KeyFn<A, K> = Arc<dyn Fn(&A) -> K + Send + Sync + 'static>;
type TransformFn<T> = Arc<dyn Fn(T) -> T + Send + Sync + 'static>;
type SkipFn<A> = Arc<dyn Fn(&A) -> bool + Send + Sync + 'static>;

/// A type-erased, reference-counted memoized function.
///
/// Cheap to clone and safe to share across Tokio tasks.
pub type MemoizedFn<A, T, E> =
    Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static>;

/// An async computation taking arguments `A` and producing `Result<T, E>`.
///
/// Any `Fn(A) -> F + Send + Sync + 'static` where `F` is a `Send` future
/// implements this trait automatically, so builder methods accept plain
/// closures and `async fn` items.
pub trait Computation<A, T, E>: Send + Sync + 'static {
    /// Runs the computation, boxing the returned future.
    fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>>;
}

impl<F, Fut, A, T, E> Computation<A, T, E> for F
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        Box::pin((self)(args))
    }
}

/// How the cache write after a miss relates to the caller's result.
///
/// In both modes a failed write is logged and counted, never returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Spawn the write on the current Tokio runtime and return immediately.
    ///
    /// Outside a runtime the write falls back to [`Inline`](Self::Inline).
    #[default]
    Detached,
    /// Await the write before returning the computed value.
    Inline,
}

struct Inner<C, A, E>
where
    C: CacheClient,
{
    cache: Arc<C>,
    compute: Arc<dyn Computation<A, C::Value, E>>,
    key_fn: KeyFn<A, C::Key>,
    options: C::Options,
    transform: TransformFn<C::Value>,
    skip: SkipFn<A>,
    write_mode: WriteMode,
    stats: Stats,
}

impl<C, A, E> Inner<C, A, E>
where
    C: CacheClient,
{
    async fn store(&self, key: C::Key, value: C::Value) {
        if let Err(e) = self.cache.set(&key, value, &self.options).await {
            self.stats.record_write_failure();
            warn!(error = %e, "cache write failed");
        }
    }
}

/// A memoized async function.
///
/// Built with [`MemoizerBuilder`]. Cloning is cheap: clones share the cache
/// client, the configuration, and the stats counters.
///
/// # Examples
///
/// ```rust,no_run
/// # use std::{collections::HashMap, convert::Infallible, sync::{Arc, Mutex}};
/// # use memoizer::cache::{BoxFuture, CacheClient};
/// # #[derive(Default)]
/// # struct MapCache(Mutex<HashMap<String, String>>);
/// # impl CacheClient for MapCache {
/// #     type Key = String;
/// #     type Value = String;
/// #     type Options = ();
/// #     type Error = Infallible;
/// #     fn get<'a>(&'a self, key: &'a String) -> BoxFuture<'a, Result<Option<String>, Infallible>> {
/// #         Box::pin(async move { Ok(self.0.lock().unwrap().get(key).cloned()) })
/// #     }
/// #     fn set<'a>(&'a self, key: &'a String, value: String, _: &'a ()) -> BoxFuture<'a, Result<(), Infallible>> {
/// #         Box::pin(async move { self.0.lock().unwrap().insert(key.clone(), value); Ok(()) })
/// #     }
/// # }
/// use memoizer::Memoized;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let greet = Memoized::builder()
///         .client(Arc::new(MapCache::default()))
///         .key_fn(|name: &String| format!("greeting:{name}"))
///         .compute(|name: String| async move { Ok::<_, Infallible>(format!("hello, {name}")) })
///         .build()?;
///
///     assert_eq!(greet.call("ada".to_owned()).await?, "hello, ada");
///     Ok(())
/// }
/// ```
pub struct Memoized<C, A, E>
where
    C: CacheClient,
{
    inner: Arc<Inner<C, A, E>>,
}

impl<C, A, E> Clone for Memoized<C, A, E>
where
    C: CacheClient,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, A, E> fmt::Debug for Memoized<C, A, E>
where
    C: CacheClient,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("write_mode", &self.inner.write_mode)
            .field("stats", &self.inner.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl<C, A, E> Memoized<C, A, E>
where
    C: CacheClient,
{
    /// Shorthand for [`MemoizerBuilder::new`].
    pub fn builder() -> MemoizerBuilder<C, A, E> {
        MemoizerBuilder::new()
    }

    /// Returns the configured write mode.
    pub fn write_mode(&self) -> WriteMode {
        self.inner.write_mode
    }

    /// Returns a snapshot of this memoizer's hit/miss counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl<C, A, E> Memoized<C, A, E>
where
    C: CacheClient + 'static,
    C::Value: Clone,
    A: Send + 'static,
    E: From<C::Error> + Send + 'static,
{
    /// Invokes the memoized function.
    ///
    /// 1. If the skip predicate accepts `args`, the computation runs directly;
    ///    no key is derived and the cache is not touched.
    /// 2. Otherwise the key function derives a key from `args` and the cache
    ///    is read. A hit returns the transformed cached value without running
    ///    the computation.
    /// 3. On a miss the computation runs with `args`, its result is written
    ///    back according to the [`WriteMode`], and the untransformed result is
    ///    returned.
    ///
    /// # Errors
    ///
    /// Computation errors are returned unchanged. Cache read errors are
    /// converted with `E::from`. Cache write errors are never returned.
    pub async fn call(&self, args: A) -> Result<C::Value, E> {
        let inner = &self.inner;

        if (inner.skip)(&args) {
            inner.stats.record_bypass();
            debug!("cache bypassed");
            return inner.compute.call(args).await;
        }

        let key = (inner.key_fn)(&args);

        if let Some(cached) = inner.cache.get(&key).await? {
            inner.stats.record_hit();
            debug!("cache hit");
            return Ok((inner.transform)(cached));
        }

        inner.stats.record_miss();
        debug!("cache miss");

        let value = inner.compute.call(args).await?;
        self.write(key, value.clone()).await;
        Ok(value)
    }

    /// Converts this memoizer into a shareable [`MemoizedFn`] value.
    pub fn into_fn(self) -> MemoizedFn<A, C::Value, E> {
        Arc::new(move |args: A| -> BoxFuture<'static, Result<C::Value, E>> {
            let this = self.clone();
            Box::pin(async move { this.call(args).await })
        })
    }

    async fn write(&self, key: C::Key, value: C::Value) {
        let handle = match self.inner.write_mode {
            WriteMode::Inline => None,
            WriteMode::Detached => tokio::runtime::Handle::try_current().ok(),
        };

        match handle {
            Some(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move { inner.store(key, value).await });
            }
            None => self.inner.store(key, value).await,
        }
    }
}
