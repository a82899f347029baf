use crate::types::{ContextResult, Value};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result};
use std::future::Future;
use std::sync::Arc;

pub type SharedCache = Arc<dyn Cache>;

/// Deferred computation for a cache miss
pub type Compute = Box<dyn FnOnce() -> BoxFuture<'static, ContextResult<Value>> + Send>;

/// Wraps a future as a [`Compute`]. The future is only polled on a miss.
pub fn deferred<F>(future: F) -> Compute
where
    F: Future<Output = ContextResult<Value>> + Send + 'static,
{
    Box::new(move || future.boxed())
}

/// Key/value result cache carried by a context
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    fn remove(&self, key: &str) -> Option<Value>;

    /// Return the cached value for `key`, computing and storing it on a miss.
    /// A failed computation is returned as is and nothing is stored.
    async fn fetch(&self, key: &str, compute: Compute) -> ContextResult<Value> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.set(key, Arc::clone(&value));
        Ok(value)
    }
}

/// Bounded in-memory cache.
///
/// Once `capacity` entries are held, new keys are not stored; existing keys can
/// still be overwritten.
pub struct MemoryCache {
    capacity: usize,
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn shared(capacity: usize) -> SharedCache {
        Arc::new(Self::new(capacity))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(key) {
            tracing::trace!(key, capacity = self.capacity, "cache full, entry dropped");
            return;
        }
        entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.entries.write().remove(key)
    }
}

impl Debug for MemoryCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("MemoryCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
