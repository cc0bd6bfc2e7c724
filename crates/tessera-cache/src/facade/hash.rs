//! Hash operations. Expiry always applies to the whole hash key.

use super::{positive_ttl, CacheFacade};
use crate::codec::Codec;
use crate::error::CacheResult;
use crate::outcome::{best_effort, Outcome};
use serde::Serialize;
use std::collections::HashMap;

impl<C: Codec> CacheFacade<C> {
    /// Raw stored text of one hash field.
    pub async fn hash_get(&self, key: &str, field: &str) -> Outcome<Option<String>> {
        if key.is_empty() {
            return Outcome::ok(None);
        }
        best_effort(
            "hash_get",
            || format!("key={}, field={}", key, field),
            None,
            self.store.hget(key, field),
        )
        .await
    }

    /// Every field of the hash as raw stored text. Empty for a missing key.
    pub async fn hash_get_all(&self, key: &str) -> Outcome<Option<HashMap<String, String>>> {
        if key.is_empty() {
            return Outcome::ok(None);
        }
        best_effort("hash_get_all", || format!("key={}", key), None, async {
            Ok(Some(self.store.hgetall(key).await?))
        })
        .await
    }

    /// Write every field of `fields` in one command.
    ///
    /// An empty map is rejected with `false`.
    pub async fn hash_set_all<V>(&self, key: &str, fields: &HashMap<String, V>) -> Outcome<bool>
    where
        V: Serialize + Sync,
    {
        self.write_fields("hash_set_all", key, fields, 0).await
    }

    /// Write every field of `fields`, then set the key's expiry when
    /// `ttl_secs` is positive.
    pub async fn hash_set_all_with_ttl<V>(
        &self,
        key: &str,
        fields: &HashMap<String, V>,
        ttl_secs: i64,
    ) -> Outcome<bool>
    where
        V: Serialize + Sync,
    {
        self.write_fields("hash_set_all_with_ttl", key, fields, ttl_secs)
            .await
    }

    async fn write_fields<V>(
        &self,
        operation: &'static str,
        key: &str,
        fields: &HashMap<String, V>,
        ttl_secs: i64,
    ) -> Outcome<bool>
    where
        V: Serialize + Sync,
    {
        if key.is_empty() || fields.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            operation,
            || format!("key={}, fields={}, ttl_secs={}", key, self.render(fields), ttl_secs),
            false,
            async {
                let entries = fields
                    .iter()
                    .map(|(field, value)| Ok((field.clone(), self.codec.encode(value)?)))
                    .collect::<CacheResult<Vec<_>>>()?;
                self.store.hset_multiple(key, &entries).await?;
                if let Some(secs) = positive_ttl(ttl_secs) {
                    self.store.expire(key, secs).await?;
                }
                Ok(true)
            },
        )
        .await
    }

    /// Upsert one field.
    pub async fn hash_set_field<T>(&self, key: &str, field: &str, value: &T) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.write_field("hash_set_field", key, field, value, 0).await
    }

    /// Upsert one field, then replace the key's expiry when `ttl_secs` is
    /// positive. Any earlier expiry on the key is overwritten.
    pub async fn hash_set_field_with_ttl<T>(
        &self,
        key: &str,
        field: &str,
        value: &T,
        ttl_secs: i64,
    ) -> Outcome<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.write_field("hash_set_field_with_ttl", key, field, value, ttl_secs)
            .await
    }

    async fn write_field<T>(
        &self,
        operation: &'static str,
        key: &str,
        field: &str,
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
            || {
                format!(
                    "key={}, field={}, value={}, ttl_secs={}",
                    key,
                    field,
                    self.render(value),
                    ttl_secs
                )
            },
            false,
            async {
                let Some(raw) = self.encode_present(value)? else {
                    return Ok(false);
                };
                self.store.hset(key, field, &raw).await?;
                if let Some(secs) = positive_ttl(ttl_secs) {
                    self.store.expire(key, secs).await?;
                }
                Ok(true)
            },
        )
        .await
    }

    /// Remove fields from the hash, returning how many existed.
    pub async fn hash_delete<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> Outcome<u64> {
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        if key.is_empty() || fields.is_empty() {
            return Outcome::ok(0);
        }
        best_effort(
            "hash_delete",
            || format!("key={}, fields={:?}", key, fields),
            0,
            self.store.hdel(key, &fields),
        )
        .await
    }

    /// Returns true if the hash has `field`.
    pub async fn hash_has_field(&self, key: &str, field: &str) -> Outcome<bool> {
        if key.is_empty() {
            return Outcome::ok(false);
        }
        best_effort(
            "hash_has_field",
            || format!("key={}, field={}", key, field),
            false,
            self.store.hexists(key, field),
        )
        .await
    }

    /// Atomically add `delta` to a numeric field, creating it at `delta`.
    ///
    /// Unlike [`increment_by`](Self::increment_by), any sign is accepted.
    pub async fn hash_increment_by(&self, key: &str, field: &str, delta: f64) -> CacheResult<f64> {
        if key.is_empty() {
            return Ok(0.0);
        }
        self.store.hincr_by_float(key, field, delta).await
    }

    /// Atomically subtract `delta` from a numeric field.
    pub async fn hash_decrement_by(&self, key: &str, field: &str, delta: f64) -> CacheResult<f64> {
        self.hash_increment_by(key, field, -delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_all_and_read_back() {
        let cache = CacheFacade::in_memory();
        let fields = HashMap::from([
            ("name".to_string(), "ada".to_string()),
            ("lang".to_string(), "en".to_string()),
        ]);
        assert!(cache.hash_set_all("user:1", &fields).await.get());

        assert_eq!(
            cache.hash_get("user:1", "name").await.into_value().as_deref(),
            Some("\"ada\"")
        );
        let all = cache.hash_get_all("user:1").await.into_value().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("lang").map(String::as_str), Some("\"en\""));
    }

    #[tokio::test]
    async fn test_get_all_missing_is_empty() {
        let cache = CacheFacade::in_memory();
        let all = cache.hash_get_all("missing").await.into_value();
        assert_eq!(all, Some(HashMap::new()));
        assert!(cache.hash_get("missing", "f").await.into_value().is_none());
    }

    #[tokio::test]
    async fn test_set_all_with_ttl() {
        let cache = CacheFacade::in_memory();
        let fields = HashMap::from([("count".to_string(), 3)]);
        assert!(cache.hash_set_all_with_ttl("h", &fields, 20).await.get());

        let ttl = cache.time_to_live("h").await.get();
        assert!(ttl > 0 && ttl <= 20);
    }

    #[tokio::test]
    async fn test_field_ttl_replaces_previous() {
        let cache = CacheFacade::in_memory();
        assert!(cache.hash_set_field_with_ttl("h", "a", &1, 1000).await.get());
        assert!(cache.hash_set_field_with_ttl("h", "b", &2, 10).await.get());

        let ttl = cache.time_to_live("h").await.get();
        assert!(ttl > 0 && ttl <= 10);
    }

    #[tokio::test]
    async fn test_field_without_ttl_keeps_expiry() {
        let cache = CacheFacade::in_memory();
        assert!(cache.hash_set_field_with_ttl("h", "a", &1, 50).await.get());
        assert!(cache.hash_set_field("h", "b", &2).await.get());

        assert!(cache.time_to_live("h").await.get() > 0);
    }

    #[tokio::test]
    async fn test_delete_and_has_field() {
        let cache = CacheFacade::in_memory();
        assert!(cache.hash_set_field("h", "a", &1).await.get());
        assert!(cache.hash_set_field("h", "b", &2).await.get());

        assert!(cache.hash_has_field("h", "a").await.get());
        assert_eq!(cache.hash_delete("h", &["a", "zzz"]).await.get(), 1);
        assert!(!cache.hash_has_field("h", "a").await.get());
        assert!(cache.hash_has_field("h", "b").await.get());
    }

    #[tokio::test]
    async fn test_increment_creates_field() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.hash_increment_by("stats", "score", 1.5).await.unwrap(), 1.5);
        assert_eq!(cache.hash_increment_by("stats", "score", 1.0).await.unwrap(), 2.5);
        assert_eq!(cache.hash_decrement_by("stats", "score", 0.5).await.unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_increment_accepts_negative_delta() {
        let cache = CacheFacade::in_memory();
        assert_eq!(cache.hash_increment_by("stats", "x", -2.0).await.unwrap(), -2.0);
        assert_eq!(cache.hash_decrement_by("stats", "x", -2.0).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_hash_op_on_string_key_is_absorbed() {
        let cache = CacheFacade::in_memory();
        assert!(cache.set("plain", &"v").await.get());

        let outcome = cache.hash_set_field("plain", "f", &1).await;
        assert!(!outcome.get());
        assert!(outcome.error().is_some());
    }
}
