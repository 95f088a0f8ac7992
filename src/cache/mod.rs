//! Cache capability — the backend contract a memoizer reads from and writes to.
//!
//! The memoizer owns no storage. Everything about where values live, how long
//! they live, and how concurrent writers are reconciled belongs to the
//! [`CacheClient`] implementation handed to it.
//!
//! ## Absence convention
//!
//! A miss is `Ok(None)` and nothing else. Any `Some(value)` is a hit, including
//! values that look "empty" such as `0`, `""` or `false`.

use std::{future::Future, pin::Pin, sync::Arc};

#[cfg(test)]
pub(crate) mod test_cache;

/// A heap-allocated, `Send` future, the return type of every [`CacheClient`]
/// operation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pluggable cache backend.
///
/// Implementors expose a read and a write keyed by [`Key`](Self::Key). Both
/// return boxed futures so the trait stays object-safe and a memoizer can hold
/// an `Arc<dyn CacheClient<...>>` as easily as a concrete client.
///
/// # Contract
///
/// - `get` resolves to `Ok(None)` when the key is absent (or expired).
/// - `set` receives the configured options unmodified; their meaning (TTL,
///   flags, compression...) is entirely backend-defined.
/// - Implementations **must** be `Send + Sync`: one client is shared by every
///   concurrent invocation of a memoized function, and detached writes run on
///   spawned Tokio tasks.
///
/// # Examples
///
/// ```rust
/// use std::{collections::HashMap, convert::Infallible, sync::Mutex};
/// use memoizer::cache::{BoxFuture, CacheClient};
///
/// #[derive(Default)]
/// struct MapCache(Mutex<HashMap<String, String>>);
///
/// impl CacheClient for MapCache {
///     type Key = String;
///     type Value = String;
///     type Options = ();
///     type Error = Infallible;
///
///     fn get<'a>(&'a self, key: &'a String) -> BoxFuture<'a, Result<Option<String>, Infallible>> {
///         Box::pin(async move { Ok(self.0.lock().unwrap().get(key).cloned()) })
///     }
///
///     fn set<'a>(
///         &'a self,
///         key: &'a String,
///         value: String,
///         _options: &'a (),
///     ) -> BoxFuture<'a, Result<(), Infallible>> {
///         Box::pin(async move {
///             self.0.lock().unwrap().insert(key.clone(), value);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait CacheClient: Send + Sync {
    /// Lookup key produced by a memoizer's key function.
    type Key: Send + Sync + 'static;
    /// Stored value; the memoized computation's output type.
    type Value: Send + 'static;
    /// Backend-specific write options, passed through untouched.
    ///
    /// `Default` supplies the payload used when a memoizer is built without
    /// explicit options.
    type Options: Default + Send + Sync + 'static;
    /// Backend failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the value stored under `key`, or `None` on a miss.
    fn get<'a>(&'a self, key: &'a Self::Key)
    -> BoxFuture<'a, Result<Option<Self::Value>, Self::Error>>;

    /// Stores `value` under `key` using the backend-specific `options`.
    fn set<'a>(
        &'a self,
        key: &'a Self::Key,
        value: Self::Value,
        options: &'a Self::Options,
    ) -> BoxFuture<'a, Result<(), Self::Error>>;

    /// Reports whether this client can currently serve reads and writes.
    ///
    /// Called once, synchronously, when a memoizer is built. A client that
    /// knows it is unusable (closed pool, read-only replica...) should return
    /// an error here so construction fails instead of every call.
    fn check(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<C> CacheClient for Arc<C>
where
    C: CacheClient + ?Sized,
{
    type Key = C::Key;
    type Value = C::Value;
    type Options = C::Options;
    type Error = C::Error;

    fn get<'a>(
        &'a self,
        key: &'a Self::Key,
    ) -> BoxFuture<'a, Result<Option<Self::Value>, Self::Error>> {
        (**self).get(key)
    }

    fn set<'a>(
        &'a self,
        key: &'a Self::Key,
        value: Self::Value,
        options: &'a Self::Options,
    ) -> BoxFuture<'a, Result<(), Self::Error>> {
        (**self).set(key, value, options)
    }

    fn check(&self) -> Result<(), Self::Error> {
        (**self).check()
    }
}
