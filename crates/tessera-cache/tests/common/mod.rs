//! Shared fixtures for the cache integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_cache::{CacheError, CacheFacade, CacheResult, KeyValueStore};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Store whose every command fails as if the connection was refused.
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    /// Number of commands attempted against the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> CacheResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn set(&self, _key: &str, _value: &str, _ttl_secs: Option<u64>) -> CacheResult<()> {
        self.fail()
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        self.fail()
    }

    async fn incr_by(&self, _key: &str, _delta: i64) -> CacheResult<i64> {
        self.fail()
    }

    async fn expire(&self, _key: &str, _ttl_secs: u64) -> CacheResult<bool> {
        self.fail()
    }

    async fn ttl(&self, _key: &str) -> CacheResult<i64> {
        self.fail()
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        self.fail()
    }

    async fn del(&self, _keys: &[String]) -> CacheResult<u64> {
        self.fail()
    }

    async fn hget(&self, _key: &str, _field: &str) -> CacheResult<Option<String>> {
        self.fail()
    }

    async fn hgetall(&self, _key: &str) -> CacheResult<HashMap<String, String>> {
        self.fail()
    }

    async fn hset(&self, _key: &str, _field: &str, _value: &str) -> CacheResult<()> {
        self.fail()
    }

    async fn hset_multiple(&self, _key: &str, _entries: &[(String, String)]) -> CacheResult<()> {
        self.fail()
    }

    async fn hdel(&self, _key: &str, _fields: &[String]) -> CacheResult<u64> {
        self.fail()
    }

    async fn hexists(&self, _key: &str, _field: &str) -> CacheResult<bool> {
        self.fail()
    }

    async fn hincr_by_float(&self, _key: &str, _field: &str, _delta: f64) -> CacheResult<f64> {
        self.fail()
    }

    async fn sadd(&self, _key: &str, _members: &[String]) -> CacheResult<u64> {
        self.fail()
    }

    async fn srem(&self, _key: &str, _members: &[String]) -> CacheResult<u64> {
        self.fail()
    }

    async fn smembers(&self, _key: &str) -> CacheResult<HashSet<String>> {
        self.fail()
    }

    async fn sismember(&self, _key: &str, _member: &str) -> CacheResult<bool> {
        self.fail()
    }

    async fn scard(&self, _key: &str) -> CacheResult<u64> {
        self.fail()
    }

    async fn lrange(&self, _key: &str, _start: i64, _stop: i64) -> CacheResult<Vec<String>> {
        self.fail()
    }

    async fn llen(&self, _key: &str) -> CacheResult<u64> {
        self.fail()
    }

    async fn lindex(&self, _key: &str, _index: i64) -> CacheResult<Option<String>> {
        self.fail()
    }

    async fn rpush(&self, _key: &str, _value: &str) -> CacheResult<u64> {
        self.fail()
    }

    async fn lrem(&self, _key: &str, _count: i64, _value: &str) -> CacheResult<u64> {
        self.fail()
    }

    async fn ltrim(&self, _key: &str, _start: i64, _stop: i64) -> CacheResult<()> {
        self.fail()
    }
}

/// Facade over a [`FailingStore`], plus the store for call counting.
pub fn failing_cache() -> (CacheFacade, Arc<FailingStore>) {
    let store = Arc::new(FailingStore::default());
    let cache = CacheFacade::new(Arc::clone(&store) as Arc<dyn KeyValueStore>);
    (cache, store)
}

/// Layer counting ERROR-level events and keeping their `args` field.
struct ErrorCounter {
    count: Arc<AtomicUsize>,
    args: Arc<Mutex<Vec<String>>>,
}

struct ArgsVisitor<'a>(&'a mut Option<String>);

impl Visit for ArgsVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "args" {
            *self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.count.fetch_add(1, Ordering::SeqCst);
            let mut args = None;
            event.record(&mut ArgsVisitor(&mut args));
            if let Some(args) = args {
                self.args.lock().push(args);
            }
        }
    }
}

/// Install a thread-local subscriber counting ERROR events.
///
/// Only events on the current thread are seen, so use it from
/// current-thread tests.
pub fn capture_errors() -> (DefaultGuard, Arc<AtomicUsize>) {
    let (guard, count, _args) = capture_error_args();
    (guard, count)
}

/// Like [`capture_errors`], also returning the rendered `args` of each
/// ERROR event.
pub fn capture_error_args() -> (DefaultGuard, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
    let count = Arc::new(AtomicUsize::new(0));
    let args = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter {
        count: Arc::clone(&count),
        args: Arc::clone(&args),
    });
    (tracing::subscriber::set_default(subscriber), count, args)
}
