use crate::node::{foreign_hop, Context, Ctx, Node, Parent};
use crate::types::CancelCause;
use std::future::Future;
use std::sync::{Arc, OnceLock, Weak};
use tokio::runtime::Runtime;
use std::time::Instant;
use tracing::{debug, error, trace};

/// Nearest ancestor whose cancellation a node must follow.
pub(crate) enum Ancestor {
    Native(Arc<Node>),
    Foreign(Arc<dyn Context>),
    None,
}

pub(crate) fn cancel_ancestor(node: &Node) -> Ancestor {
    let mut parent = &node.parent;
    loop {
        match parent {
            None => return Ancestor::None,
            Some(Parent::Foreign(foreign)) => return Ancestor::Foreign(Arc::clone(foreign)),
            Some(Parent::Native(ctx)) => {
                let candidate = &ctx.0;
                if candidate.detached {
                    return Ancestor::None;
                }
                if candidate.cancel.is_some() {
                    return Ancestor::Native(Arc::clone(candidate));
                }
                parent = &candidate.parent;
            }
        }
    }
}

/// Moves `node` to its terminal state and cancels every descendant that was
/// registered at that moment.
///
/// Returns `false` without side effects when the node is not cancelable or
/// another cancellation already won.
pub(crate) fn cancel(node: &Arc<Node>, cause: CancelCause, remove_from_parent: bool) -> bool {
    if !transition(node, &cause) {
        return false;
    }

    if remove_from_parent {
        if let Ancestor::Native(parent) = cancel_ancestor(node) {
            if let Some(state) = parent.cancel.as_ref() {
                state.remove_child(node);
            }
        }
    }

    // Children of a canceled node never need to deregister: the node's list
    // is emptied as part of taking the snapshot.
    let mut pending = take_children(node);
    while let Some(child) = pending.pop() {
        if transition(&child, &cause) {
            pending.extend(take_children(&child));
        }
    }
    true
}

fn transition(node: &Node, cause: &CancelCause) -> bool {
    let Some(state) = node.cancel.as_ref() else {
        return false;
    };
    if !state.try_cancel(cause.clone()) {
        return false;
    }
    debug!(node = %node.id, %cause, "context canceled");
    true
}

fn take_children(node: &Node) -> Vec<Arc<Node>> {
    node.cancel
        .as_ref()
        .map(|state| state.take_children())
        .unwrap_or_default()
}

/// Hooks a freshly built cancelable node up to whatever it inherits
/// cancellation from.
pub(crate) fn propagate(child: &Ctx) {
    match cancel_ancestor(&child.0) {
        Ancestor::None => {}
        Ancestor::Native(parent) => register(&parent, &child.0),
        Ancestor::Foreign(foreign) => bridge(child, foreign),
    }
}

/// Registers `child` with `parent`, then re-reads the parent's cause.
///
/// A cancel that took its snapshot of the children before the insert landed
/// has already stored its cause, so the re-read is guaranteed to see it and
/// the child is canceled here instead of being silently skipped.
pub(crate) fn register(parent: &Arc<Node>, child: &Arc<Node>) {
    let Some(state) = parent.cancel.as_ref() else {
        return;
    };
    if state.add_child(child) {
        trace!(parent = %parent.id, child = %child.id, "child registered");
    }
    if let Some(cause) = state.cause() {
        cancel(child, cause, true);
    }
}

/// Follows a foreign context's signal with a one-shot watcher.
fn bridge(child: &Ctx, foreign: Arc<dyn Context>) {
    let Some(state) = child.0.cancel.as_ref() else {
        return;
    };
    let Some(signal) = foreign_hop(|| foreign.done()).flatten() else {
        return;
    };
    if signal.is_closed() {
        cancel(&child.0, foreign_cause(&foreign), true);
        return;
    }

    debug!(node = %child.0.id, "bridging foreign cancellation");
    let (own, released) = (state.signal(), state.released());
    let node = Arc::downgrade(&child.0);
    spawn_watcher(async move {
        tokio::select! {
            biased;
            _ = released.wait() => {}
            _ = own.wait() => {}
            _ = signal.wait() => {
                if let Some(node) = node.upgrade() {
                    if cancel(&node, foreign_cause(&foreign), true) {
                        debug!(node = %node.id, "foreign context canceled node");
                    }
                }
            }
        }
    });
}

fn foreign_cause(foreign: &Arc<dyn Context>) -> CancelCause {
    foreign_hop(|| foreign.err())
        .flatten()
        .unwrap_or(CancelCause::Canceled)
}

/// Starts the waiter that expires `child` at `at`, unless its parent or a
/// local cancel gets there first.
pub(crate) fn arm_deadline(child: &Ctx, at: Instant) {
    let Some(state) = child.0.cancel.as_ref() else {
        return;
    };
    if state.is_canceled() {
        return;
    }
    if at <= Instant::now() {
        cancel(&child.0, CancelCause::DeadlineExceeded, true);
        return;
    }

    let (own, released) = (state.signal(), state.released());
    let parent_done = child.0.parent.as_ref().and_then(Parent::done);
    let node: Weak<Node> = Arc::downgrade(&child.0);
    trace!(node = %child.0.id, "deadline armed");

    spawn_watcher(async move {
        let parent_done = async move {
            match parent_done {
                Some(signal) => signal.wait().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = released.wait() => {}
            _ = own.wait() => {}
            _ = parent_done => {
                if let Some(node) = node.upgrade() {
                    let cause = node
                        .parent
                        .as_ref()
                        .and_then(Parent::err)
                        .unwrap_or(CancelCause::Canceled);
                    cancel(&node, cause, true);
                }
            }
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(at)) => {
                if let Some(node) = node.upgrade() {
                    if cancel(&node, CancelCause::DeadlineExceeded, true) {
                        debug!(node = %node.id, "deadline exceeded");
                    }
                }
            }
        }
    });
}

/// Runs a watcher on the ambient tokio runtime, or on a shared background
/// runtime when called outside of one.
///
/// Watchers end once the node they serve is canceled or dropped.
pub(crate) fn spawn_watcher<F>(watcher: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(watcher);
        return;
    }
    match watcher_runtime() {
        Some(runtime) => {
            runtime.spawn(watcher);
        }
        None => error!("no runtime available, watcher dropped"),
    }
}

static WATCHER_RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();

fn watcher_runtime() -> Option<&'static Runtime> {
    WATCHER_RUNTIME
        .get_or_init(|| {
            let built = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("ctxtree-watcher")
                .enable_time()
                .build();
            match built {
                Ok(runtime) => Some(runtime),
                Err(err) => {
                    error!(%err, "failed to start watcher runtime");
                    None
                }
            }
        })
        .as_ref()
}
