//! Key-value store abstraction.
//!
//! The facade talks to the store exclusively through [`KeyValueStore`]. All
//! payloads cross this seam as text; encoding is the facade's job.

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::{create_pool, RedisStore};

use crate::error::CacheResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Value returned by [`KeyValueStore::ttl`] for a key without expiration.
pub const TTL_PERSISTENT: i64 = -1;

/// Value returned by [`KeyValueStore::ttl`] for a missing key.
pub const TTL_MISSING: i64 = -2;

/// Remote key-value store holding strings, hashes, sets and lists.
///
/// Method semantics and return conventions follow the Redis command of the
/// same name. List indices are inclusive and negative indices count from
/// the tail (`-1` is the last element).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    // ============ Keys ============

    /// `SET`, or `SET EX` when `ttl_secs` is given.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> CacheResult<()>;

    /// `GET`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// `INCRBY`. A negative delta decrements.
    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// `EXPIRE`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<bool>;

    /// `TTL`. Remaining seconds, [`TTL_PERSISTENT`] or [`TTL_MISSING`].
    async fn ttl(&self, key: &str) -> CacheResult<i64>;

    /// `EXISTS`.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// `DEL`. Returns the number of keys removed.
    async fn del(&self, keys: &[String]) -> CacheResult<u64>;

    // ============ Hashes ============

    /// `HGET`.
    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>>;

    /// `HGETALL`. Empty for a missing key.
    async fn hgetall(&self, key: &str) -> CacheResult<HashMap<String, String>>;

    /// `HSET` with a single field.
    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()>;

    /// `HSET` with several fields in one command.
    async fn hset_multiple(&self, key: &str, entries: &[(String, String)]) -> CacheResult<()>;

    /// `HDEL`. Returns the number of fields removed.
    async fn hdel(&self, key: &str, fields: &[String]) -> CacheResult<u64>;

    /// `HEXISTS`.
    async fn hexists(&self, key: &str, field: &str) -> CacheResult<bool>;

    /// `HINCRBYFLOAT`. Creates the field at `delta` when absent.
    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> CacheResult<f64>;

    // ============ Sets ============

    /// `SADD`. Returns the number of members that were not already present.
    async fn sadd(&self, key: &str, members: &[String]) -> CacheResult<u64>;

    /// `SREM`. Returns the number of members removed.
    async fn srem(&self, key: &str, members: &[String]) -> CacheResult<u64>;

    /// `SMEMBERS`. Empty for a missing key.
    async fn smembers(&self, key: &str) -> CacheResult<HashSet<String>>;

    /// `SISMEMBER`.
    async fn sismember(&self, key: &str, member: &str) -> CacheResult<bool>;

    /// `SCARD`.
    async fn scard(&self, key: &str) -> CacheResult<u64>;

    // ============ Lists ============

    /// `LRANGE`, inclusive on both ends.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>>;

    /// `LLEN`.
    async fn llen(&self, key: &str) -> CacheResult<u64>;

    /// `LINDEX`.
    async fn lindex(&self, key: &str, index: i64) -> CacheResult<Option<String>>;

    /// `RPUSH` of one element. Returns the new length.
    async fn rpush(&self, key: &str, value: &str) -> CacheResult<u64>;

    /// `LREM`. `count > 0` removes from the head, `count < 0` from the tail,
    /// `count == 0` removes every occurrence.
    async fn lrem(&self, key: &str, count: i64, value: &str) -> CacheResult<u64>;

    /// `LTRIM`. An empty resulting range removes the key.
    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()>;
}
