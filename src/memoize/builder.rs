//! Memoizer construction and configuration validation.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::{Computation, Inner, KeyFn, Memoized, SkipFn, TransformFn, WriteMode, stats::Stats};
use crate::cache::CacheClient;

/// Boxed error produced by a cache provider or a failed readiness check.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building a [`Memoized`] function.
///
/// All of them are detected synchronously in [`MemoizerBuilder::build`];
/// no memoized function exists until the configuration is valid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing cache capability")]
    MissingCache,

    #[error("invalid cache capability: {0}")]
    InvalidCache(#[source] BoxError),

    #[error("invalid cache provider: {0}")]
    InvalidProvider(#[source] BoxError),

    #[error("fn and keyFn are required")]
    MissingFunctions,
}

type Provider<C> = Box<dyn FnOnce() -> Result<C, BoxError> + Send>;

/// Builder for [`Memoized`] functions.
///
/// A cache comes from either [`client`](Self::client) or
/// [`client_provider`](Self::client_provider); when both are set the explicit
/// client wins and the provider is never called. [`compute`](Self::compute)
/// and [`key_fn`](Self::key_fn) are mandatory; everything else has a default:
///
/// | Setting                               | Default                        |
/// |---------------------------------------|--------------------------------|
/// | [`set_options`](Self::set_options)    | `C::Options::default()`        |
/// | [`transform`](Self::transform)        | identity                       |
/// | [`skip_cache`](Self::skip_cache)      | never skip                     |
/// | [`write_mode`](Self::write_mode)      | [`WriteMode::Detached`]        |
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
/// use memoizer::MemoizerBuilder;
///
/// # fn main() -> Result<(), memoizer::ConfigError> {
/// let lookup = MemoizerBuilder::new()
///     .client(Arc::new(MapCache::default()))
///     .key_fn(|(user, region): &(String, String)| format!("{user},{region}"))
///     .compute(|(user, _region): (String, String)| async move {
///         Ok::<_, Infallible>(user.to_uppercase())
///     })
///     .build()?;
/// # let _ = lookup;
/// # Ok(())
/// # }
/// ```
pub struct MemoizerBuilder<C, A, E>
where
    C: CacheClient,
{
    client: Option<Arc<C>>,
    provider: Option<Provider<C>>,
    compute: Option<Arc<dyn Computation<A, C::Value, E>>>,
    key_fn: Option<KeyFn<A, C::Key>>,
    options: Option<C::Options>,
    transform: Option<TransformFn<C::Value>>,
    skip: Option<SkipFn<A>>,
    write_mode: WriteMode,
}

impl<C, A, E> Default for MemoizerBuilder<C, A, E>
where
    C: CacheClient,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, A, E> MemoizerBuilder<C, A, E>
where
    C: CacheClient,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            client: None,
            provider: None,
            compute: None,
            key_fn: None,
            options: None,
            transform: None,
            skip: None,
            write_mode: WriteMode::default(),
        }
    }

    /// Uses an existing cache client.
    pub fn client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    /// Obtains the cache client from `provider` at build time.
    ///
    /// The provider runs at most once, inside [`build`](Self::build), and only
    /// if no explicit [`client`](Self::client) was given. An error from it
    /// fails the build with [`ConfigError::InvalidProvider`].
    pub fn client_provider<F, Err>(mut self, provider: F) -> Self
    where
        F: FnOnce() -> Result<C, Err> + Send + 'static,
        Err: Into<BoxError>,
    {
        self.provider = Some(Box::new(move || -> Result<C, BoxError> {
            provider().map_err(Into::into)
        }));
        self
    }

    /// Sets the async computation being memoized.
    pub fn compute<F>(mut self, compute: F) -> Self
    where
        F: Computation<A, C::Value, E>,
    {
        self.compute = Some(Arc::new(compute));
        self
    }

    /// Sets the function deriving a cache key from the call arguments.
    pub fn key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&A) -> C::Key + Send + Sync + 'static,
    {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    /// Sets the options passed, untouched, to every cache write.
    pub fn set_options(mut self, options: C::Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the function applied to values read back from the cache.
    ///
    /// Freshly computed results are returned as-is; only cache hits pass
    /// through the transform.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(C::Value) -> C::Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Sets a predicate that, when it returns `true`, routes a call straight
    /// to the computation without deriving a key or touching the cache.
    pub fn skip_cache<F>(mut self, skip: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Chooses whether cache writes are awaited or detached.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Validates the configuration, resolves the cache client, and returns
    /// the memoized function.
    ///
    /// # Errors
    ///
    /// Checked in this order; the cache is resolved before the functions,
    /// so a provider runs even when the build then fails on them.
    ///
    /// - [`ConfigError::MissingCache`] if neither a client nor a provider was
    ///   set.
    /// - [`ConfigError::InvalidProvider`] if the provider returned an error.
    /// - [`ConfigError::InvalidCache`] if the resolved client fails
    ///   [`CacheClient::check`].
    /// - [`ConfigError::MissingFunctions`] if the computation or key function
    ///   was not set.
    pub fn build(self) -> Result<Memoized<C, A, E>, ConfigError> {
        let (cache, source) = match (self.client, self.provider) {
            (Some(client), _) => (client, "client"),
            (None, Some(provider)) => {
                let client = provider().map_err(ConfigError::InvalidProvider)?;
                (Arc::new(client), "provider")
            }
            (None, None) => return Err(ConfigError::MissingCache),
        };

        cache
            .check()
            .map_err(|e| ConfigError::InvalidCache(Box::new(e)))?;

        let (Some(compute), Some(key_fn)) = (self.compute, self.key_fn) else {
            return Err(ConfigError::MissingFunctions);
        };

        let transform: TransformFn<C::Value> = match self.transform {
            Some(transform) => transform,
            None => Arc::new(|value: C::Value| value),
        };
        let skip: SkipFn<A> = match self.skip {
            Some(skip) => skip,
            None => Arc::new(|_: &A| false),
        };

        debug!(source, write_mode = ?self.write_mode, "memoizer built");

        Ok(Memoized {
            inner: Arc::new(Inner {
                cache,
                compute,
                key_fn,
                options: self.options.unwrap_or_default(),
                transform,
                skip,
                write_mode: self.write_mode,
                stats: Stats::default(),
            }),
        })
    }
}
