use super::{AppConfig, Logger, MemoryCache, SharedCache, SharedLogger, TracingLogger};
use crate::cell::AtomicRef;
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque application handle shared by every context of one application.
///
/// It owns the application-wide logger and cache, which resolvers fall back
/// to when no context in a chain defines its own.
pub struct Application {
    id: Uuid,
    config: AppConfig,
    started_at: DateTime<Utc>,
    logger: SharedLogger,
    cache: SharedCache,
}

impl Application {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let logger = TracingLogger::new().with_field("app", &config.name);
        let cache = MemoryCache::shared(config.cache_capacity);
        Self::with_parts(config, logger, cache)
    }

    pub fn with_parts(config: AppConfig, logger: SharedLogger, cache: SharedCache) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            config,
            started_at: Utc::now(),
            logger,
            cache,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn logger(&self) -> SharedLogger {
        Arc::clone(&self.logger)
    }

    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }
}

impl Debug for Application {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Holder of the "current application" that resolvers fall back to.
///
/// Clones share the same slot. Contexts capture the registry they were built
/// with, so separate registries give fully isolated trees.
#[derive(Clone, Default)]
pub struct AppRegistry {
    current: Arc<AtomicRef<Application>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_application(app: Arc<Application>) -> Self {
        Self {
            current: Arc::new(AtomicRef::new(app)),
        }
    }

    pub fn current(&self) -> Option<Arc<Application>> {
        self.current.load()
    }

    /// Installs `app` and returns the one it replaced.
    pub fn set(&self, app: Arc<Application>) -> Option<Arc<Application>> {
        self.current.swap(Some(app))
    }

    pub fn clear(&self) -> Option<Arc<Application>> {
        self.current.swap(None)
    }

    pub fn ptr_eq(&self, other: &AppRegistry) -> bool {
        Arc::ptr_eq(&self.current, &other.current)
    }
}

impl Debug for AppRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("AppRegistry")
            .field("current", &self.current().map(|app| app.id()))
            .finish()
    }
}
