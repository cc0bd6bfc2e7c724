//! Redis-backed store.

use super::KeyValueStore;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use std::collections::{HashMap, HashSet};
use tessera_config::RedisConfig;
use tracing::{debug, info};

/// Create a Redis connection pool and check that the server answers.
pub async fn create_pool(config: &RedisConfig) -> CacheResult<Pool> {
    info!(url = %redact(&config.url), pool_size = config.pool_size, "Creating Redis connection pool");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| CacheError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CacheError::Configuration(format!("Failed to create pool: {}", e)))?;

    let mut conn = pool.get().await?;
    redis::cmd("PING").query_async::<String>(&mut *conn).await?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

/// Strip credentials from a Redis URL before logging it.
fn redact(url: &str) -> String {
    match url.rsplit_once('@') {
        Some((head, host)) => {
            let scheme = head.split("://").next().unwrap_or("redis");
            format!("{}://***@{}", scheme, host)
        }
        None => url.to_string(),
    }
}

/// Store backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build the pool from configuration and wrap it.
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisStore")
            .field("max_size", &status.max_size)
            .field("available", &status.available)
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl_secs {
            Some(secs) => conn.set_ex::<_, _, ()>(key, value, secs).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        debug!(key, ttl_secs, "SET");
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }
        Ok(value)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.conn().await?;
        Ok(conn.incr(key, delta).await?)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let applied: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(applied)
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.conn().await?;
        let remaining: i64 = redis::cmd("TTL").arg(key).query_async(&mut conn).await?;
        Ok(remaining)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.exists(key).await?)
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let deleted: u64 = conn.del(keys).await?;
        debug!(requested = keys.len(), deleted, "DEL");
        Ok(deleted)
    }

    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hget(key, field).await?)
    }

    async fn hgetall(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hgetall(key).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, entries: &[(String, String)]) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.hset_multiple::<_, _, _, ()>(key, entries).await?;
        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.hdel(key, fields).await?)
    }

    async fn hexists(&self, key: &str, field: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.hexists(key, field).await?)
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> CacheResult<f64> {
        let mut conn = self.conn().await?;
        let value: f64 = redis::cmd("HINCRBYFLOAT")
            .arg(key)
            .arg(field)
            .arg(delta)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.sadd(key, members).await?)
    }

    async fn srem(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.srem(key, members).await?)
    }

    async fn smembers(&self, key: &str) -> CacheResult<HashSet<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.smembers(key).await?)
    }

    async fn sismember(&self, key: &str, member: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.sismember(key, member).await?)
    }

    async fn scard(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.scard(key).await?)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let values: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn llen(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.llen(key).await?)
    }

    async fn lindex(&self, key: &str, index: i64) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = redis::cmd("LINDEX")
            .arg(key)
            .arg(index)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn rpush(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.rpush(key, value).await?)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let removed: u64 = redis::cmd("LREM")
            .arg(key)
            .arg(count)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("LTRIM")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
