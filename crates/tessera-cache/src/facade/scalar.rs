//! Plain values and integer counters.

use super::{positive_ttl, CacheFacade};
use crate::codec::Codec;
use crate::error::{CacheError, CacheResult};
use crate::outcome::{best_effort, Outcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

impl<C: Codec> CacheFacade<C> {
    /// Store a value without expiration, replacing whatever the key held.
    pub async fn set<T>(&self, key: &str, value: &T) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.write_value("set", key, value, 0).await
    }

    /// Store a value, expiring it after `ttl_secs` when positive.
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl_secs: i64) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.write_value("set_with_ttl", key, value, ttl_secs).await
    }

    async fn write_value<T>(
        &self,
        operation: &'static str,
        key: &str,
        value: &T,
        ttl_secs: i64,
    ) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            operation,
            || format!("key={}, value={}, ttl_secs={}", key, self.render(value), ttl_secs),
            false,
            async {
                let Some(raw) = self.encode_present(value)? else {
                    return Ok(false);
                };
                self.store.set(key, &raw, positive_ttl(ttl_secs)).await?;
                Ok(true)
            },
        )
        .await
    }

    /// Read and decode the value at `key`.
    ///
    /// `Ok(None)` when the key is absent. Malformed payloads are returned as
    /// [`CacheError::InvalidValue`].
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        if key.is_empty() {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(raw) => self.decode_stored(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Read the value at `key` as a sequence of `T`.
    pub async fn get_list<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<Vec<T>>> {
        if key.is_empty() {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(raw) => self.decode_stored_list(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Atomically add `delta` to the integer at `key`, creating it at `delta`.
    ///
    /// A negative delta is rejected before the store is contacted.
    pub async fn increment_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        check_delta("increment", delta)?;
        if key.is_empty() {
            return Ok(0);
        }
        self.store.incr_by(key, delta).await
    }

    /// Atomically subtract `delta` from the integer at `key`.
    ///
    /// A negative delta is rejected before the store is contacted.
    pub async fn decrement_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        check_delta("decrement", delta)?;
        if key.is_empty() {
            return Ok(0);
        }
        self.store.incr_by(key, -delta).await
    }

    /// Return the cached value at `key`, or load, cache and return it.
    ///
    /// The write-back is best-effort: a failing store still hands the loaded
    /// value to the caller.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, ttl_secs: i64, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await? {
            return Ok(cached);
        }

        debug!(key, "Loading value after cache miss");
        let value = loader().await?;
        let _ = self.set_with_ttl(key, &value, ttl_secs).await;
        Ok(value)
    }
}

fn check_delta(operation: &str, delta: i64) -> CacheResult<()> {
    if delta < 0 {
        return Err(CacheError::InvalidArgument(format!(
            "{} delta must be non-negative, got {}",
            operation, delta
        )));
    }
    Ok(())
}
