//! Typed access layer over a [`KeyValueStore`].
//!
//! Operations are grouped by the structure they touch: plain values and
//! counters, key expiry, hashes, sets and lists. Each group lives in its own
//! `impl` block.
//!
//! Three failure classes:
//! - Empty keys, null values and empty argument lists short-circuit with the
//!   neutral value and never reach the store.
//! - Mutations and untyped reads are best-effort and return an
//!   [`Outcome`](crate::outcome::Outcome).
//! - Typed reads and counters return a `CacheResult`; decode errors,
//!   store errors and negative counter deltas propagate.

mod expiry;
mod hash;
mod list;
mod scalar;
mod set;

use crate::codec::{Codec, JsonCodec};
use crate::error::{CacheError, CacheResult};
use crate::store::{KeyValueStore, MemoryStore, RedisStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tessera_config::RedisConfig;
use tracing::info;

/// Caching facade over a remote key-value store.
///
/// Stateless apart from the store handle; clones share the same store and
/// the facade can be used from many tasks at once.
#[derive(Clone)]
pub struct CacheFacade<C: Codec = JsonCodec> {
    store: Arc<dyn KeyValueStore>,
    codec: C,
}

impl CacheFacade<JsonCodec> {
    /// Create a facade over a store using the JSON codec.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_codec(store, JsonCodec)
    }

    /// Create a facade over a fresh in-process store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Create a facade from configuration.
    ///
    /// Connects to Redis when enabled, otherwise falls back to an
    /// in-process store.
    pub async fn from_config(config: &RedisConfig) -> CacheResult<Self> {
        if config.enabled {
            let store = RedisStore::connect(config).await?;
            Ok(Self::new(Arc::new(store)))
        } else {
            info!("Redis disabled, using in-process store");
            Ok(Self::in_memory())
        }
    }
}

impl<C: Codec> CacheFacade<C> {
    /// Create a facade with a custom codec.
    #[must_use]
    pub fn with_codec(store: Arc<dyn KeyValueStore>, codec: C) -> Self {
        Self { store, codec }
    }

    /// The underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The codec used for values.
    #[must_use]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Encode a value, returning `None` when it encodes to null.
    fn encode_present<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Option<String>> {
        let raw = self.codec.encode(value)?;
        Ok((!self.codec.is_null(&raw)).then_some(raw))
    }

    /// Encode every value of a sequence.
    fn encode_all<T: Serialize>(&self, values: &[T]) -> CacheResult<Vec<String>> {
        values.iter().map(|v| self.codec.encode(v)).collect()
    }

    /// Decode text stored at `key`.
    fn decode_stored<T: DeserializeOwned>(&self, key: &str, raw: &str) -> CacheResult<T> {
        self.codec.decode(raw).map_err(|e| invalid_value(key, &e))
    }

    /// Decode text stored at `key` that holds a sequence.
    fn decode_stored_list<T: DeserializeOwned>(&self, key: &str, raw: &str) -> CacheResult<Vec<T>> {
        self.codec.decode_list(raw).map_err(|e| invalid_value(key, &e))
    }

    /// Render a value for a log line.
    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        self.codec
            .encode(value)
            .unwrap_or_else(|e| format!("<unencodable: {}>", e))
    }
}

impl<C: Codec> std::fmt::Debug for CacheFacade<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade").finish_non_exhaustive()
    }
}

/// Positive TTLs attach expiry; zero and negative mean permanent.
fn positive_ttl(ttl_secs: i64) -> Option<u64> {
    u64::try_from(ttl_secs).ok().filter(|secs| *secs > 0)
}

fn invalid_value(key: &str, err: &CacheError) -> CacheError {
    CacheError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// Owned copies of the non-empty keys in a slice.
fn non_empty<K: AsRef<str>>(keys: &[K]) -> Vec<String> {
    keys.iter()
        .map(AsRef::as_ref)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
