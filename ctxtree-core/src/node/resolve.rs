use super::context::{foreign_hop, Context};
use super::core::{Ctx, Node, Parent};
use crate::cell::AtomicRef;
use crate::collab::{
    AppConfig, Application, Compute, MemoryCache, SharedCache, SharedLogger, TracingLogger,
};
use crate::types::{CancelCause, ContextError, ContextResult, Value};
use std::sync::Arc;
use tracing::trace;

/// Outcome of walking a chain for an inherited handle
#[derive(Debug)]
pub(crate) enum Resolution<H> {
    Found(H),
    /// Nothing in the chain defines the handle.
    Missing,
    /// The walk gave up at the foreign delegation limit.
    CutOff,
}

impl<H> Resolution<H> {
    pub(crate) fn found(self) -> Option<H> {
        match self {
            Resolution::Found(handle) => Some(handle),
            Resolution::Missing | Resolution::CutOff => None,
        }
    }
}

/// Which handle a walk resolves, and how it crosses boundaries.
struct Slot<H: 'static> {
    cell: fn(&Node) -> &AtomicRef<H>,
    foreign: fn(&dyn Context) -> Option<H>,
    /// Whether a detached node still inherits this handle from above.
    crosses_detach: bool,
}

fn logger_cell(node: &Node) -> &AtomicRef<SharedLogger> {
    &node.logger
}

fn cache_cell(node: &Node) -> &AtomicRef<SharedCache> {
    &node.cache
}

fn application_cell(node: &Node) -> &AtomicRef<Arc<Application>> {
    &node.application
}

fn foreign_logger(context: &dyn Context) -> Option<SharedLogger> {
    context.lookup_logger()
}

fn foreign_cache(context: &dyn Context) -> Option<SharedCache> {
    context.lookup_cache()
}

fn foreign_application(context: &dyn Context) -> Option<Arc<Application>> {
    context.lookup_application()
}

const LOGGER: Slot<SharedLogger> = Slot {
    cell: logger_cell,
    foreign: foreign_logger,
    crosses_detach: true,
};

const CACHE: Slot<SharedCache> = Slot {
    cell: cache_cell,
    foreign: foreign_cache,
    crosses_detach: true,
};

// Detached nodes copy their application at construction and stop there
const APPLICATION: Slot<Arc<Application>> = Slot {
    cell: application_cell,
    foreign: foreign_application,
    crosses_detach: false,
};

impl Ctx {
    /// Walks toward the root for the nearest node holding the handle and
    /// caches the answer in every node passed on the way. Misses and cut-offs
    /// are never cached.
    fn resolve<H: Clone + 'static>(&self, slot: &Slot<H>) -> Resolution<H> {
        let mut pending: Vec<&Node> = Vec::new();
        let mut node: &Node = &self.0;
        let resolution = loop {
            if let Some(handle) = (slot.cell)(node).load() {
                break Resolution::Found((*handle).clone());
            }
            pending.push(node);
            if node.detached && !slot.crosses_detach {
                break Resolution::Missing;
            }
            match &node.parent {
                None => break Resolution::Missing,
                Some(Parent::Native(parent)) => node = &*parent.0,
                Some(Parent::Foreign(parent)) => {
                    break match foreign_hop(|| (slot.foreign)(parent.as_ref())) {
                        Some(Some(handle)) => Resolution::Found(handle),
                        Some(None) => Resolution::Missing,
                        None => Resolution::CutOff,
                    }
                }
            }
        };

        if let Resolution::Found(handle) = &resolution {
            let shared = Arc::new(handle.clone());
            for node in pending {
                (slot.cell)(node).get_or_publish(Arc::clone(&shared));
            }
        }
        resolution
    }

    pub(crate) fn resolve_logger(&self) -> Resolution<SharedLogger> {
        self.resolve(&LOGGER)
    }

    pub(crate) fn resolve_cache(&self) -> Resolution<SharedCache> {
        self.resolve(&CACHE)
    }

    pub(crate) fn resolve_application(&self) -> Resolution<Arc<Application>> {
        self.resolve(&APPLICATION)
    }

    /// The application for this context: the nearest one set in the chain,
    /// otherwise the registry's current application.
    pub fn application(&self) -> Option<Arc<Application>> {
        match self.resolve_application() {
            Resolution::Found(app) => Some(app),
            Resolution::Missing | Resolution::CutOff => self.0.registry.current(),
        }
    }

    /// The logger for this context.
    ///
    /// Falls back to the application's logger, then to a fresh
    /// [`TracingLogger`].
    pub fn logger(&self) -> SharedLogger {
        match self.resolve_logger() {
            Resolution::Found(logger) => logger,
            fallback => {
                trace!(node = %self.0.id, ?fallback, "logger not found in chain");
                self.application()
                    .map(|app| app.logger())
                    .unwrap_or_else(TracingLogger::shared)
            }
        }
    }

    /// The cache for this context.
    ///
    /// Falls back to the application's cache. Without an application, a
    /// default [`MemoryCache`] is installed at the root of the native chain so
    /// every context sharing that root sees the same entries.
    pub fn cache(&self) -> SharedCache {
        match self.resolve_cache() {
            Resolution::Found(cache) => cache,
            _ => match self.application() {
                Some(app) => app.cache(),
                None => {
                    let root = self.native_root();
                    let fresh = MemoryCache::shared(AppConfig::default().cache_capacity);
                    let installed = root.cache.get_or_publish(Arc::new(fresh));
                    trace!(node = %root.id, "default cache installed");
                    (*installed).clone()
                }
            },
        }
    }

    /// Topmost native node above this one.
    fn native_root(&self) -> &Node {
        let mut node: &Node = &self.0;
        while let Some(Parent::Native(parent)) = &node.parent {
            node = &*parent.0;
        }
        node
    }

    pub fn with_logger(&self, logger: SharedLogger) -> Ctx {
        Ctx(Arc::new(Node {
            logger: AtomicRef::new(Arc::new(logger)),
            ..self.derive()
        }))
    }

    pub fn with_cache(&self, cache: SharedCache) -> Ctx {
        Ctx(Arc::new(Node {
            cache: AtomicRef::new(Arc::new(cache)),
            ..self.derive()
        }))
    }

    pub fn with_application(&self, app: Arc<Application>) -> Ctx {
        Ctx(Arc::new(Node {
            application: AtomicRef::new(Arc::new(app)),
            ..self.derive()
        }))
    }

    /// Fetch-or-compute through this context's cache, abandoned with the
    /// context's cause if it is canceled first.
    pub async fn fetch(&self, key: &str, compute: Compute) -> ContextResult<Value> {
        if let Some(cause) = self.err() {
            return Err(ContextError::Cancelled(cause));
        }
        let cache = self.cache();
        tokio::select! {
            biased;
            _ = self.cancelled() => {
                Err(ContextError::Cancelled(self.err().unwrap_or(CancelCause::Canceled)))
            }
            result = cache.fetch(key, compute) => result,
        }
    }
}
