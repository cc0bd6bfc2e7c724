//! In-process store with Redis command semantics.
//!
//! Used when Redis is disabled in configuration and as the backend for
//! tests. Expired keys are purged lazily on access.

use super::{KeyValueStore, TTL_MISSING, TTL_PERSISTENT};
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    List(VecDeque<String>),
}

impl Value {
    fn is_empty_aggregate(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = HashMap<String, Entry>;

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Returns true when no live key is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Look up a live entry, dropping it first if it has expired.
fn live<'a>(entries: &'a mut Entries, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

/// Remove the key if its aggregate value became empty.
fn prune(entries: &mut Entries, key: &str) {
    if entries.get(key).is_some_and(|e| e.value.is_empty_aggregate()) {
        entries.remove(key);
    }
}

/// Expiry instant `secs` from now, rejected when it cannot be represented.
fn deadline(command: &str, secs: u64) -> CacheResult<Instant> {
    Instant::now()
        .checked_add(Duration::from_secs(secs))
        .ok_or_else(|| {
            CacheError::InvalidArgument(format!("invalid expire time in '{}' command", command))
        })
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::WrongType {
        key: key.to_string(),
    }
}

macro_rules! typed_entry {
    ($name:ident, $name_or_create:ident, $variant:ident, $ty:ty) => {
        fn $name<'a>(entries: &'a mut Entries, key: &str) -> CacheResult<Option<&'a mut $ty>> {
            match live(entries, key) {
                None => Ok(None),
                Some(Entry {
                    value: Value::$variant(inner),
                    ..
                }) => Ok(Some(inner)),
                Some(_) => Err(wrong_type(key)),
            }
        }

        fn $name_or_create<'a>(entries: &'a mut Entries, key: &str) -> CacheResult<&'a mut $ty> {
            if live(entries, key).is_none() {
                entries.insert(key.to_string(), Entry::new(Value::$variant(Default::default())));
            }
            match entries.get_mut(key) {
                Some(Entry {
                    value: Value::$variant(inner),
                    ..
                }) => Ok(inner),
                _ => Err(wrong_type(key)),
            }
        }
    };
}

typed_entry!(hash_of, hash_or_create, Hash, HashMap<String, String>);
typed_entry!(set_of, set_or_create, Set, HashSet<String>);
typed_entry!(list_of, list_or_create, List, VecDeque<String>);

/// Resolve an inclusive, possibly negative range against a list length.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop.min(len - 1) as usize))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> CacheResult<()> {
        let entry = Entry {
            value: Value::Str(value.to_string()),
            expires_at: ttl_secs.map(|secs| deadline("set", secs)).transpose()?,
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock();
        match live(&mut entries, key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut entries = self.entries.lock();
        let current = match live(&mut entries, key) {
            None => 0,
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => s.parse::<i64>().map_err(|_| CacheError::InvalidValue {
                key: key.to_string(),
                message: "value is not an integer or out of range".to_string(),
            })?,
            Some(_) => return Err(wrong_type(key)),
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::InvalidValue {
                key: key.to_string(),
                message: "increment or decrement would overflow".to_string(),
            })?;
        match entries.get_mut(key) {
            Some(entry) => entry.value = Value::Str(next.to_string()),
            None => {
                entries.insert(key.to_string(), Entry::new(Value::Str(next.to_string())));
            }
        }
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<bool> {
        let expires_at = deadline("expire", ttl_secs)?;
        let mut entries = self.entries.lock();
        if live(&mut entries, key).is_none() {
            return Ok(false);
        }
        if ttl_secs == 0 {
            entries.remove(key);
        } else if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(expires_at);
        }
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let mut entries = self.entries.lock();
        Ok(match live(&mut entries, key) {
            None => TTL_MISSING,
            Some(Entry {
                expires_at: None, ..
            }) => TTL_PERSISTENT,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => {
                let remaining = at.saturating_duration_since(Instant::now()).as_millis();
                ((remaining + 500) / 1000) as i64
            }
        })
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        Ok(live(&mut entries, key).is_some())
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let mut deleted = 0;
        for key in keys {
            if live(&mut entries, key).is_some() {
                entries.remove(key);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock();
        Ok(hash_of(&mut entries, key)?.and_then(|h| h.get(field).cloned()))
    }

    async fn hgetall(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        let mut entries = self.entries.lock();
        Ok(hash_of(&mut entries, key)?.cloned().unwrap_or_default())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock();
        hash_or_create(&mut entries, key)?.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, entries_in: &[(String, String)]) -> CacheResult<()> {
        if entries_in.is_empty() {
            return Err(CacheError::InvalidArgument(
                "wrong number of arguments for 'hset' command".to_string(),
            ));
        }
        let mut entries = self.entries.lock();
        let hash = hash_or_create(&mut entries, key)?;
        for (field, value) in entries_in {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let removed = match hash_of(&mut entries, key)? {
            None => 0,
            Some(hash) => fields.iter().filter(|f| hash.remove(*f).is_some()).count() as u64,
        };
        prune(&mut entries, key);
        Ok(removed)
    }

    async fn hexists(&self, key: &str, field: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        Ok(hash_of(&mut entries, key)?.is_some_and(|h| h.contains_key(field)))
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> CacheResult<f64> {
        let mut entries = self.entries.lock();
        let current = match hash_of(&mut entries, key)?.and_then(|h| h.get(field).cloned()) {
            None => 0.0,
            Some(raw) => raw.parse::<f64>().map_err(|_| CacheError::InvalidValue {
                key: key.to_string(),
                message: format!("hash value of field '{}' is not a float", field),
            })?,
        };
        let next = current + delta;
        if !next.is_finite() {
            return Err(CacheError::InvalidValue {
                key: key.to_string(),
                message: "increment would produce NaN or Infinity".to_string(),
            });
        }
        hash_or_create(&mut entries, key)?.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let set = set_or_create(&mut entries, key)?;
        Ok(members.iter().filter(|m| set.insert((*m).clone())).count() as u64)
    }

    async fn srem(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let removed = match set_of(&mut entries, key)? {
            None => 0,
            Some(set) => members.iter().filter(|m| set.remove(*m)).count() as u64,
        };
        prune(&mut entries, key);
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> CacheResult<HashSet<String>> {
        let mut entries = self.entries.lock();
        Ok(set_of(&mut entries, key)?.cloned().unwrap_or_default())
    }

    async fn sismember(&self, key: &str, member: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock();
        Ok(set_of(&mut entries, key)?.is_some_and(|s| s.contains(member)))
    }

    async fn scard(&self, key: &str) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        Ok(set_of(&mut entries, key)?.map_or(0, |s| s.len() as u64))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        let mut entries = self.entries.lock();
        let Some(list) = list_of(&mut entries, key)? else {
            return Ok(Vec::new());
        };
        Ok(match normalize_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn llen(&self, key: &str) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        Ok(list_of(&mut entries, key)?.map_or(0, |l| l.len() as u64))
    }

    async fn lindex(&self, key: &str, index: i64) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock();
        let Some(list) = list_of(&mut entries, key)? else {
            return Ok(None);
        };
        let len = list.len() as i64;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return Ok(None);
        }
        Ok(list.get(index as usize).cloned())
    }

    async fn rpush(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let list = list_or_create(&mut entries, key)?;
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        let removed = match list_of(&mut entries, key)? {
            None => 0,
            Some(list) => {
                let limit = if count == 0 {
                    usize::MAX
                } else {
                    count.unsigned_abs() as usize
                };
                let mut positions: Vec<usize> = list
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.as_str() == value)
                    .map(|(i, _)| i)
                    .collect();
                if count < 0 {
                    positions.reverse();
                }
                positions.truncate(limit);
                positions.sort_unstable_by(|a, b| b.cmp(a));
                for i in &positions {
                    list.remove(*i);
                }
                positions.len() as u64
            }
        };
        prune(&mut entries, key);
        Ok(removed)
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()> {
        let mut entries = self.entries.lock();
        if let Some(list) = list_of(&mut entries, key)? {
            match normalize_range(list.len(), start, stop) {
                Some((from, to)) => {
                    list.truncate(to + 1);
                    list.drain(..from);
                }
                None => list.clear(),
            }
        }
        prune(&mut entries, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(3, 0, -1), Some((0, 2)));
        assert_eq!(normalize_range(3, -2, -1), Some((1, 2)));
        assert_eq!(normalize_range(3, 0, 100), Some((0, 2)));
        assert_eq!(normalize_range(3, -100, 0), Some((0, 0)));
        assert_eq!(normalize_range(3, 1, 0), None);
        assert_eq!(normalize_range(3, 5, 10), None);
        assert_eq!(normalize_range(0, 0, -1), None);
    }

    #[tokio::test]
    async fn test_set_clears_ttl() {
        let store = MemoryStore::new();
        store.set("k", "1", Some(60)).await.unwrap();
        assert!(store.ttl("k").await.unwrap() > 0);

        store.set("k", "2", None).await.unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), TTL_PERSISTENT);
        assert_eq!(store.ttl("missing").await.unwrap(), TTL_MISSING);
    }

    #[tokio::test]
    async fn test_expired_key_disappears() {
        let store = MemoryStore::new();
        store.set("short", "v", Some(1)).await.unwrap();
        assert!(store.exists("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!store.exists("short").await.unwrap());
        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.rpush("list", "a").await.unwrap();
        assert!(matches!(
            store.get("list").await,
            Err(CacheError::WrongType { .. })
        ));
        assert!(matches!(
            store.hset("list", "f", "v").await,
            Err(CacheError::WrongType { .. })
        ));

        // SET replaces any structure
        store.set("list", "plain", None).await.unwrap();
        assert_eq!(store.get("list").await.unwrap().as_deref(), Some("plain"));
    }

    #[tokio::test]
    async fn test_incr_by() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_by("n", 5).await.unwrap(), 5);
        assert_eq!(store.incr_by("n", -7).await.unwrap(), -2);

        store.set("text", "abc", None).await.unwrap();
        assert!(matches!(
            store.incr_by("text", 1).await,
            Err(CacheError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_incr_keeps_ttl() {
        let store = MemoryStore::new();
        store.set("n", "1", Some(100)).await.unwrap();
        store.incr_by("n", 1).await.unwrap();
        assert!(store.ttl("n").await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set("k", "v", Some(u64::MAX)).await,
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(!store.exists("k").await.unwrap());

        store.set("k", "v", Some(60)).await.unwrap();
        assert!(matches!(
            store.expire("k", i64::MAX as u64).await,
            Err(CacheError::InvalidArgument(_))
        ));
        // The earlier expiry is left in place.
        let ttl = store.ttl("k").await.unwrap();
        assert!(ttl > 0 && ttl <= 60);
    }

    #[tokio::test]
    async fn test_non_finite_hash_increment_creates_nothing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.hincr_by_float("h", "f", f64::INFINITY).await,
            Err(CacheError::InvalidValue { .. })
        ));
        assert!(!store.exists("h").await.unwrap());

        store.hset("h", "f", "1").await.unwrap();
        assert!(store.hincr_by_float("h", "f", f64::NAN).await.is_err());
        assert_eq!(store.hget("h", "f").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let store = MemoryStore::new();
        assert!(!store.expire("nope", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_ops() {
        let store = MemoryStore::new();
        store
            .hset_multiple("h", &[("a".into(), "1".into()), ("b".into(), "2".into())])
            .await
            .unwrap();
        assert_eq!(store.hget("h", "a").await.unwrap().as_deref(), Some("1"));
        assert!(store.hexists("h", "b").await.unwrap());
        assert_eq!(store.hgetall("h").await.unwrap().len(), 2);

        assert_eq!(store.hincr_by_float("h", "c", 1.5).await.unwrap(), 1.5);
        assert_eq!(store.hincr_by_float("h", "c", -0.5).await.unwrap(), 1.0);

        assert_eq!(store.hdel("h", &strings(&["a", "b", "c", "zz"])).await.unwrap(), 3);
        assert!(!store.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.sadd("s", &strings(&["a", "a", "b"])).await.unwrap(), 2);
        assert_eq!(store.sadd("s", &strings(&["b", "c"])).await.unwrap(), 1);
        assert_eq!(store.scard("s").await.unwrap(), 3);
        assert!(store.sismember("s", "c").await.unwrap());
        assert_eq!(store.srem("s", &strings(&["a", "x"])).await.unwrap(), 1);
        assert_eq!(store.smembers("s").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_index_and_range() {
        let store = MemoryStore::new();
        for v in ["a", "b", "c"] {
            store.rpush("l", v).await.unwrap();
        }
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), strings(&["a", "b", "c"]));
        assert_eq!(store.lrange("l", -2, -1).await.unwrap(), strings(&["b", "c"]));
        assert_eq!(store.lindex("l", -1).await.unwrap().as_deref(), Some("c"));
        assert_eq!(store.lindex("l", 3).await.unwrap(), None);
        assert_eq!(store.llen("l").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lrem_count_semantics() {
        let store = MemoryStore::new();
        for v in ["x", "y", "x", "z", "x"] {
            store.rpush("l", v).await.unwrap();
        }
        assert_eq!(store.lrem("l", 1, "x").await.unwrap(), 1);
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), strings(&["y", "x", "z", "x"]));

        assert_eq!(store.lrem("l", -1, "x").await.unwrap(), 1);
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), strings(&["y", "x", "z"]));

        store.rpush("l", "x").await.unwrap();
        assert_eq!(store.lrem("l", 0, "x").await.unwrap(), 2);
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), strings(&["y", "z"]));
    }

    #[tokio::test]
    async fn test_ltrim() {
        let store = MemoryStore::new();
        for v in ["a", "b", "c", "d"] {
            store.rpush("l", v).await.unwrap();
        }
        store.ltrim("l", 1, 2).await.unwrap();
        assert_eq!(store.lrange("l", 0, -1).await.unwrap(), strings(&["b", "c"]));

        store.ltrim("l", 1, 0).await.unwrap();
        assert_eq!(store.llen("l").await.unwrap(), 0);
        assert!(!store.exists("l").await.unwrap());
    }

    #[tokio::test]
    async fn test_del_counts_live_keys() {
        let store = MemoryStore::new();
        store.set("a", "1", None).await.unwrap();
        store.sadd("b", &strings(&["m"])).await.unwrap();
        assert_eq!(store.del(&strings(&["a", "b", "c"])).await.unwrap(), 2);
        assert!(store.is_empty());
    }
}
