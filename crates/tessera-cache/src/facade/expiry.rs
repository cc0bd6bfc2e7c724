//! Key-level expiry, existence and deletion.

use super::{non_empty, positive_ttl, CacheFacade};
use crate::codec::Codec;
use crate::outcome::{best_effort, Outcome};

impl<C: Codec> CacheFacade<C> {
    /// Set or refresh the expiry of `key`.
    ///
    /// Returns false without contacting the store when `ttl_secs <= 0`, and
    /// false from the store when the key does not exist.
    pub async fn expire(&self, key: &str, ttl_secs: i64) -> Outcome<bool> {
        let Some(secs) = positive_ttl(ttl_secs) else {
            return Outcome::ok(false);
        };
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            "expire",
            || format!("key={}, ttl_secs={}", key, ttl_secs),
            false,
            self.store.expire(key, secs),
        )
        .await
    }

    /// Remaining seconds before `key` expires.
    ///
    /// `0` both for keys without expiry and for absent keys; use
    /// [`exists`](Self::exists) to tell them apart.
    pub async fn time_to_live(&self, key: &str) -> Outcome<i64> {
        if key.is_empty() {
            return Outcome::ok(0);
        }
        best_effort("time_to_live", || format!("key={}", key), 0, async {
            let remaining = self.store.ttl(key).await?;
            Ok(remaining.max(0))
        })
        .await
    }

    /// Returns true if `key` holds any value.
    pub async fn exists(&self, key: &str) -> Outcome<bool> {
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort("exists", || format!("key={}", key), false, self.store.exists(key)).await
    }

    /// Delete every listed key, returning how many existed.
    ///
    /// Empty keys are skipped; an empty list is a no-op.
    pub async fn delete<K: AsRef<str>>(&self, keys: &[K]) -> Outcome<u64> {
        let keys = non_empty(keys);
        if keys.is_empty() {
            return Outcome::ok(0);
        }
        best_effort(
            "delete",
            || format!("keys={:?}", keys),
            0,
            self.store.del(&keys),
        )
        .await
    }
}
