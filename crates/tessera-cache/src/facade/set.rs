//! Unordered set operations. Members are stored as encoded text.

use super::{positive_ttl, CacheFacade};
use crate::codec::Codec;
use crate::outcome::{best_effort, Outcome};
use serde::Serialize;
use std::collections::HashSet;

impl<C: Codec> CacheFacade<C> {
    /// Every member of the set as raw stored text. Empty for a missing key.
    pub async fn set_members(&self, key: &str) -> Outcome<Option<HashSet<String>>> {
        if key.is_empty() {
            return Outcome::ok(None);
        }
        best_effort("set_members", || format!("key={}", key), None, async {
            Ok(Some(self.store.smembers(key).await?))
        })
        .await
    }

    /// Returns true if `value` is a member of the set.
    pub async fn set_contains<T>(&self, key: &str, value: &T) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            "set_contains",
            || format!("key={}, value={}", key, self.render(value)),
            false,
            async {
                let Some(member) = self.encode_present(value)? else {
                    return Ok(false);
                };
                self.store.sismember(key, &member).await
            },
        )
        .await
    }

    /// Add members, returning how many were new.
    pub async fn set_add<T>(&self, key: &str, values: &[T]) -> Outcome<u64>
    where
        T: Serialize + Sync,
    {
        self.add_members("set_add", key, values, 0).await
    }

    /// Add members, then set the key's expiry when `ttl_secs` is positive.
    pub async fn set_add_with_ttl<T>(&self, key: &str, values: &[T], ttl_secs: i64) -> Outcome<u64>
    where
        T: Serialize + Sync,
    {
        self.add_members("set_add_with_ttl", key, values, ttl_secs).await
    }

    async fn add_members<T>(
        &self,
        operation: &'static str,
        key: &str,
        values: &[T],
        ttl_secs: i64,
    ) -> Outcome<u64>
    where
        T: Serialize + Sync,
    {
        if key.is_empty() || values.is_empty() {
            return Outcome::ok(0);
        }
        best_effort(
            operation,
            || format!("key={}, values={}, ttl_secs={}", key, self.render(values), ttl_secs),
            0,
            async {
                let members = self.encode_all(values)?;
                let added = self.store.sadd(key, &members).await?;
                if let Some(secs) = positive_ttl(ttl_secs) {
                    self.store.expire(key, secs).await?;
                }
                Ok(added)
            },
        )
        .await
    }

    /// Number of members.
    pub async fn set_size(&self, key: &str) -> Outcome<u64> {
        if key.is_empty() {
            return Outcome::ok(0);
        }
        best_effort("set_size", || format!("key={}", key), 0, self.store.scard(key)).await
    }

    /// Remove members, returning how many were present.
    pub async fn set_remove<T>(&self, key: &str, values: &[T]) -> Outcome<u64>
    where
        T: Serialize + Sync,
    {
        if key.is_empty() || values.is_empty() {
            return Outcome::ok(0);
        }
        best_effort(
            "set_remove",
            || format!("key={}, values={}", key, self.render(values)),
            0,
            async {
                let members = self.encode_all(values)?;
                self.store.srem(key, &members).await
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.set_add("tags", &["a", "a", "b"]).await.get(), 2);
        assert_eq!(cache.set_size("tags").await.get(), 2);
        assert_eq!(cache.set_add("tags", &["b", "c"]).await.get(), 1);
    }

    #[tokio::test]
    async fn test_members_are_encoded_text() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.set_add("ids", &[1, 2]).await.get(), 2);

        let members = cache.set_members("ids").await.into_value().unwrap();
        assert_eq!(members, HashSet::from(["1".to_string(), "2".to_string()]));
        assert!(cache.set_contains("ids", &2).await.get());
        assert!(!cache.set_contains("ids", &3).await.get());
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.set_add("s", &["x", "y"]).await.get(), 2);
        assert_eq!(cache.set_remove("s", &["x", "z"]).await.get(), 1);
        assert_eq!(cache.set_remove("s", &["y"]).await.get(), 1);
        assert!(!cache.exists("s").await.get());
    }

    #[tokio::test]
    async fn test_add_with_ttl() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.set_add_with_ttl("s", &["x"], 15).await.get(), 1);

        let ttl = cache.time_to_live("s").await.get();
        assert!(ttl > 0 && ttl <= 15);
    }

    #[tokio::test]
    async fn test_missing_set() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.set_members("none").await.into_value(), Some(HashSet::new()));
        assert_eq!(cache.set_size("none").await.get(), 0);
    }
}
