use crate::cancel::Signal;
use crate::collab::{Application, SharedCache, SharedLogger};
use crate::types::{CancelCause, Key, Value};
use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

/// Maximum number of nested delegations into foreign contexts on one thread.
///
/// Native parent chains cannot form cycles, so only a foreign context that
/// delegates back into the tree can loop. Past this depth lookups give up and
/// callers fall back to their defaults.
pub const MAX_RESOLVE_DEPTH: usize = 10;

/// Read side of an execution context.
///
/// [`Ctx`](crate::Ctx) is the native implementation. Any other implementation
/// is a foreign context and can be bridged into a tree with
/// [`Ctx::adapt`](crate::Ctx::adapt).
pub trait Context: Send + Sync + 'static {
    /// When the context expires, if ever.
    fn deadline(&self) -> Option<Instant>;

    /// Signal closed on cancellation, or `None` for contexts that can never
    /// be canceled.
    fn done(&self) -> Option<Signal>;

    /// Why the context was canceled, or `None` while it is active.
    fn err(&self) -> Option<CancelCause>;

    fn value(&self, key: &Key) -> Option<Value>;

    /// Logger defined by this context or inherited from its ancestors.
    fn lookup_logger(&self) -> Option<SharedLogger> {
        None
    }

    fn lookup_cache(&self) -> Option<SharedCache> {
        None
    }

    fn lookup_application(&self) -> Option<Arc<Application>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

thread_local! {
    static FOREIGN_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct HopGuard;

impl Drop for HopGuard {
    fn drop(&mut self) {
        FOREIGN_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Runs `hop` as one nested delegation into a foreign context, or returns
/// `None` once [`MAX_RESOLVE_DEPTH`] delegations are already in flight.
pub(crate) fn foreign_hop<R>(hop: impl FnOnce() -> R) -> Option<R> {
    let depth = FOREIGN_DEPTH.with(Cell::get);
    if depth >= MAX_RESOLVE_DEPTH {
        tracing::warn!(depth, "foreign context depth limit reached");
        return None;
    }
    FOREIGN_DEPTH.with(|current| current.set(depth + 1));
    let _guard = HopGuard;
    Some(hop())
}
