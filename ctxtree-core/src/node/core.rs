use super::context::{foreign_hop, Context};
use super::request::RequestScope;
use crate::cancel::{self, CancelHandle, CancelState, Signal};
use crate::cell::AtomicRef;
use crate::collab::{AppRegistry, Application, SharedCache, SharedLogger};
use crate::types::{CancelCause, Key, Value};
use std::any::Any;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a native context node, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Where a node came from
#[derive(Clone)]
pub(crate) enum Parent {
    Native(Ctx),
    Foreign(Arc<dyn Context>),
}

impl Parent {
    /// Native contexts, including the one inside a [`RequestScope`], become
    /// native parents; anything else stays foreign.
    pub(crate) fn from_dyn(context: Arc<dyn Context>) -> Self {
        let any = context.as_any();
        if let Some(ctx) = any.downcast_ref::<Ctx>() {
            return Parent::Native(ctx.clone());
        }
        if let Some(scope) = any.downcast_ref::<RequestScope>() {
            return Parent::Native(scope.ctx().clone());
        }
        Parent::Foreign(context)
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        match self {
            Parent::Native(ctx) => ctx.deadline(),
            Parent::Foreign(foreign) => foreign_hop(|| foreign.deadline()).flatten(),
        }
    }

    pub(crate) fn done(&self) -> Option<Signal> {
        match self {
            Parent::Native(ctx) => ctx.done(),
            Parent::Foreign(foreign) => foreign_hop(|| foreign.done()).flatten(),
        }
    }

    pub(crate) fn err(&self) -> Option<CancelCause> {
        match self {
            Parent::Native(ctx) => ctx.err(),
            Parent::Foreign(foreign) => foreign_hop(|| foreign.err()).flatten(),
        }
    }
}

/// A single context node. Everything but the lazily resolved handles is
/// fixed at construction.
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<Parent>,
    pub(crate) entry: Option<(Key, Value)>,
    pub(crate) cancel: Option<CancelState>,
    pub(crate) deadline: Option<Instant>,
    pub(crate) detached: bool,
    pub(crate) logger: AtomicRef<SharedLogger>,
    pub(crate) cache: AtomicRef<SharedCache>,
    pub(crate) application: AtomicRef<Arc<Application>>,
    pub(crate) registry: AppRegistry,
}

impl Node {
    pub(crate) fn new(parent: Option<Parent>, registry: AppRegistry) -> Self {
        Self {
            id: NodeId::next(),
            parent,
            entry: None,
            cancel: None,
            deadline: None,
            detached: false,
            logger: AtomicRef::empty(),
            cache: AtomicRef::empty(),
            application: AtomicRef::empty(),
            registry,
        }
    }
}

pub(crate) enum Visit<R> {
    Found(R),
    Continue,
    Stop,
}

/// Handle to a native execution context.
///
/// Cloning is cheap and yields the same node. Derived contexts never change
/// their parent: every `with_*` call returns a new node.
#[derive(Clone)]
pub struct Ctx(pub(crate) Arc<Node>);

impl Ctx {
    /// A root that carries nothing and can never be canceled.
    pub fn background() -> Self {
        Self::background_with(AppRegistry::new())
    }

    /// Same as [`Ctx::background`], for code that has not decided which
    /// context to pass yet.
    pub fn todo() -> Self {
        Self::background()
    }

    /// A root whose application lookups fall back to `registry`.
    pub fn background_with(registry: AppRegistry) -> Self {
        Ctx(Arc::new(Node::new(None, registry)))
    }

    /// A native node on top of any context.
    ///
    /// The node follows the parent's cancellation when the parent exposes a
    /// signal: native parents register it as a child, foreign parents are
    /// watched.
    pub fn new_context(parent: Arc<dyn Context>, registry: &AppRegistry) -> Self {
        let parent = Parent::from_dyn(parent);
        let cancelable = parent.done().is_some();
        let node = Node {
            cancel: cancelable.then(CancelState::new),
            ..Node::new(Some(parent), registry.clone())
        };
        let ctx = Ctx(Arc::new(node));
        if cancelable {
            cancel::propagate(&ctx);
        }
        ctx
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.0.registry
    }

    pub fn is_detached(&self) -> bool {
        self.0.detached
    }

    pub(crate) fn derive(&self) -> Node {
        Node::new(
            Some(Parent::Native(self.clone())),
            self.0.registry.clone(),
        )
    }

    pub fn with_value(&self, key: impl Into<Key>, value: impl Any + Send + Sync) -> Ctx {
        self.with_shared_value(key, Arc::new(value))
    }

    pub fn with_shared_value(&self, key: impl Into<Key>, value: Value) -> Ctx {
        Ctx(Arc::new(Node {
            entry: Some((key.into(), value)),
            ..self.derive()
        }))
    }

    /// A cancelable child and the handle that cancels it.
    pub fn with_cancel(&self) -> (Ctx, CancelHandle) {
        let child = Ctx(Arc::new(Node {
            cancel: Some(CancelState::new()),
            ..self.derive()
        }));
        cancel::propagate(&child);
        let handle = CancelHandle::new(&child);
        (child, handle)
    }

    /// A cancelable child that expires at `at`.
    ///
    /// When this context already expires no later than `at`, the child simply
    /// inherits the earlier deadline and arms no timer of its own.
    pub fn with_deadline(&self, at: Instant) -> (Ctx, CancelHandle) {
        if let Some(current) = self.deadline() {
            if current <= at {
                return self.with_cancel();
            }
        }

        let child = Ctx(Arc::new(Node {
            cancel: Some(CancelState::new()),
            deadline: Some(at),
            ..self.derive()
        }));
        cancel::propagate(&child);
        cancel::arm_deadline(&child, at);
        let handle = CancelHandle::new(&child);
        (child, handle)
    }

    pub fn with_timeout(&self, timeout: Duration) -> (Ctx, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Typed view of [`Context::value`].
    pub fn value_as<T: Any + Send + Sync>(&self, key: impl Into<Key>) -> Option<Arc<T>> {
        self.value(&key.into())?.downcast::<T>().ok()
    }

    /// Waits until this context is canceled. Never completes for contexts
    /// without a signal.
    pub async fn cancelled(&self) {
        match self.done() {
            Some(signal) => signal.wait().await,
            None => std::future::pending::<()>().await,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Walks from this node toward the root until `visit` decides, handing
    /// the rest of the walk to `foreign` if a foreign parent is reached.
    pub(crate) fn walk<R>(
        &self,
        mut visit: impl FnMut(&Node) -> Visit<R>,
        foreign: impl FnOnce(&dyn Context) -> Option<R>,
    ) -> Option<R> {
        let mut node: &Node = &self.0;
        loop {
            match visit(node) {
                Visit::Found(found) => return Some(found),
                Visit::Stop => return None,
                Visit::Continue => {}
            }
            match &node.parent {
                None => return None,
                Some(Parent::Native(parent)) => node = &*parent.0,
                Some(Parent::Foreign(parent)) => {
                    return foreign_hop(|| foreign(parent.as_ref())).flatten()
                }
            }
        }
    }
}

impl Context for Ctx {
    fn deadline(&self) -> Option<Instant> {
        self.walk(
            |node| match node.deadline {
                _ if node.detached => Visit::Stop,
                Some(at) => Visit::Found(at),
                None => Visit::Continue,
            },
            |foreign| foreign.deadline(),
        )
    }

    fn done(&self) -> Option<Signal> {
        self.walk(
            |node| match &node.cancel {
                _ if node.detached => Visit::Stop,
                Some(state) => Visit::Found(state.signal()),
                None => Visit::Continue,
            },
            |foreign| foreign.done(),
        )
    }

    fn err(&self) -> Option<CancelCause> {
        self.walk(
            |node| match &node.cancel {
                _ if node.detached => Visit::Stop,
                Some(state) => state.cause().map_or(Visit::Stop, Visit::Found),
                None => Visit::Continue,
            },
            |foreign| foreign.err(),
        )
    }

    fn value(&self, key: &Key) -> Option<Value> {
        self.walk(
            |node| match &node.entry {
                Some((entry_key, value)) if entry_key == key => Visit::Found(Arc::clone(value)),
                _ => Visit::Continue,
            },
            |foreign| foreign.value(key),
        )
    }

    fn lookup_logger(&self) -> Option<SharedLogger> {
        self.resolve_logger().found()
    }

    fn lookup_cache(&self) -> Option<SharedCache> {
        self.resolve_cache().found()
    }

    fn lookup_application(&self) -> Option<Arc<Application>> {
        self.resolve_application().found()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Debug for Ctx {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let node = &self.0;
        f.debug_struct("Ctx")
            .field("id", &node.id)
            .field("key", &node.entry.as_ref().map(|(key, _)| key))
            .field("cancelable", &node.cancel.is_some())
            .field("deadline", &node.deadline)
            .field("detached", &node.detached)
            .finish()
    }
}
