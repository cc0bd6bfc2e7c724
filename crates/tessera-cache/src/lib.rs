//! # Tessera Cache
//!
//! Typed caching facade over a Redis-style key-value store.
//!
//! [`CacheFacade`] exposes scalar, hash, set, list and expiry operations,
//! encodes values through a [`Codec`] and absorbs store failures on
//! best-effort paths into an [`Outcome`].
//!
//! ```no_run
//! use tessera_cache::CacheFacade;
//! use tessera_config::RedisConfig;
//!
//! # async fn run() -> tessera_cache::CacheResult<()> {
//! let cache = CacheFacade::from_config(&RedisConfig::default()).await?;
//! if cache.set_with_ttl("greeting", "hello", 60).await.get() {
//!     let value: Option<String> = cache.get("greeting").await?;
//!     assert_eq!(value.as_deref(), Some("hello"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod facade;
pub mod metrics;
pub mod outcome;
pub mod store;

pub use codec::{Codec, JsonCodec};
pub use error::{CacheError, CacheResult};
pub use facade::CacheFacade;
pub use outcome::Outcome;
pub use store::{create_pool, KeyValueStore, MemoryStore, RedisStore, TTL_MISSING, TTL_PERSISTENT};
