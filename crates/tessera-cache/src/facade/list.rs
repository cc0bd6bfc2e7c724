//! List operations.
//!
//! Indices are inclusive and follow the store: `0` is the head and negative
//! indices count back from the tail (`-1` is the last element).

use super::{positive_ttl, CacheFacade};
use crate::codec::Codec;
use crate::error::CacheResult;
use crate::outcome::{best_effort, Outcome};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<C: Codec> CacheFacade<C> {
    /// Decode the elements between `start` and `end`.
    ///
    /// `Some(vec![])` for a missing key or an out-of-range window.
    pub async fn list_range<T: DeserializeOwned>(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> CacheResult<Option<Vec<T>>> {
        if key.is_empty() {
            return Ok(None);
        }
        let raw = self.store.lrange(key, start, end).await?;
        raw.iter()
            .map(|element| self.decode_stored(key, element))
            .collect::<CacheResult<Vec<T>>>()
            .map(Some)
    }

    /// Number of elements.
    pub async fn list_size(&self, key: &str) -> Outcome<u64> {
        if key.is_empty() {
            return Outcome::ok(0);
        }
        best_effort("list_size", || format!("key={}", key), 0, self.store.llen(key)).await
    }

    /// Raw stored text of the element at `index`.
    pub async fn list_get_at_index(&self, key: &str, index: i64) -> Outcome<Option<String>> {
        if key.is_empty() {
            return Outcome::ok(None);
        }
        best_effort(
            "list_get_at_index",
            || format!("key={}, index={}", key, index),
            None,
            self.store.lindex(key, index),
        )
        .await
    }

    /// Decode the element at `index`.
    pub async fn list_get_object_at_index<T: DeserializeOwned>(
        &self,
        key: &str,
        index: i64,
    ) -> CacheResult<Option<T>> {
        if key.is_empty() {
            return Ok(None);
        }
        match self.store.lindex(key, index).await? {
            Some(raw) => self.decode_stored(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Decode the element at `index` as a nested sequence.
    pub async fn list_get_list_at_index<T: DeserializeOwned>(
        &self,
        key: &str,
        index: i64,
    ) -> CacheResult<Option<Vec<T>>> {
        if key.is_empty() {
            return Ok(None);
        }
        match self.store.lindex(key, index).await? {
            Some(raw) => self.decode_stored_list(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Append to the tail, then set the key's expiry when `ttl_secs` is
    /// positive.
    pub async fn list_push_right<T>(&self, key: &str, value: &T, ttl_secs: i64) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            "list_push_right",
            || format!("key={}, value={}, ttl_secs={}", key, self.render(value), ttl_secs),
            false,
            async {
                let Some(raw) = self.encode_present(value)? else {
                    return Ok(false);
                };
                self.store.rpush(key, &raw).await?;
                if let Some(secs) = positive_ttl(ttl_secs) {
                    self.store.expire(key, secs).await?;
                }
                Ok(true)
            },
        )
        .await
    }

    /// Remove occurrences of `value`, returning how many went.
    ///
    /// `count > 0` removes from the head, `count < 0` from the tail and
    /// `count == 0` removes every occurrence.
    pub async fn list_remove<T>(&self, key: &str, count: i64, value: &T) -> Outcome<u64>
    where
        T: Serialize + Sync + ?Sized,
    {
        if key.is_empty() {
            return Outcome::ok(0);
        }
        best_effort(
            "list_remove",
            || format!("key={}, count={}, value={}", key, count, self.render(value)),
            0,
            async {
                let raw = self.codec.encode(value)?;
                self.store.lrem(key, count, &raw).await
            },
        )
        .await
    }

    /// Keep only the elements between `start` and `end`.
    ///
    /// A window that selects nothing (e.g. `start > end`) empties the list.
    pub async fn list_trim(&self, key: &str, start: i64, end: i64) -> Outcome<()> {
        if key.is_empty() {
            return Outcome::ok(());
        }
        best_effort(
            "list_trim",
            || format!("key={}, start={}, end={}", key, start, end),
            (),
            self.store.ltrim(key, start, end),
        )
        .await
    }
}
