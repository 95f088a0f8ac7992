//! # memoizer
//!
//! Async function memoization over a pluggable cache backend.
//!
//! Wrap an async computation together with a key function and any
//! [`CacheClient`](cache::CacheClient); the resulting [`Memoized`] function
//! reads the cache first and only runs the computation on a miss.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::{collections::HashMap, convert::Infallible, sync::{Arc, Mutex}};
//!
//! use memoizer::{MemoizerBuilder, cache::{BoxFuture, CacheClient}};
//!
//! #[derive(Default)]
//! struct MapCache(Mutex<HashMap<String, String>>);
//!
//! impl CacheClient for MapCache {
//!     type Key = String;
//!     type Value = String;
//!     type Options = ();
//!     type Error = Infallible;
//!
//!     fn get<'a>(&'a self, key: &'a String) -> BoxFuture<'a, Result<Option<String>, Infallible>> {
//!         Box::pin(async move { Ok(self.0.lock().unwrap().get(key).cloned()) })
//!     }
//!
//!     fn set<'a>(&'a self, key: &'a String, value: String, _: &'a ()) -> BoxFuture<'a, Result<(), Infallible>> {
//!         Box::pin(async move {
//!             self.0.lock().unwrap().insert(key.clone(), value);
//!             Ok(())
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetch = MemoizerBuilder::new()
//!         .client(Arc::new(MapCache::default()))
//!         .key_fn(|url: &String| format!("page:{url}"))
//!         .compute(|url: String| async move { Ok::<_, Infallible>(format!("<body of {url}>")) })
//!         .skip_cache(|url: &String| url.ends_with("?fresh"))
//!         .build()?;
//!
//!     let page = fetch.call("https://example.com".to_owned()).await?;
//!     println!("{page}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod memoize;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{BoxFuture, CacheClient};
pub use memoize::{
    BoxError, Computation, ConfigError, Memoized, MemoizedFn, MemoizerBuilder, StatsSnapshot,
    WriteMode,
};
