use super::{Signal, SignalSource};
use crate::cell::AtomicRef;
use crate::node::Node;
use crate::types::CancelCause;
use std::sync::{Arc, Weak};

type ChildList = Vec<Weak<Node>>;

/// Cancellation state owned by a cancelable node.
pub(crate) struct CancelState {
    done: SignalSource,
    /// Closed when the state is dropped, ending any watcher of the node.
    released: SignalSource,
    cause: AtomicRef<CancelCause>,
    children: AtomicRef<ChildList>,
}

impl CancelState {
    pub(crate) fn new() -> Self {
        Self {
            done: SignalSource::new(),
            released: SignalSource::new(),
            cause: AtomicRef::empty(),
            children: AtomicRef::empty(),
        }
    }

    pub(crate) fn signal(&self) -> Signal {
        self.done.signal()
    }

    pub(crate) fn released(&self) -> Signal {
        self.released.signal()
    }

    pub(crate) fn cause(&self) -> Option<CancelCause> {
        self.cause.load().map(|cause| (*cause).clone())
    }

    pub(crate) fn is_canceled(&self) -> bool {
        !self.cause.is_empty()
    }

    /// Records `cause` and closes the signal if no cause is set yet. Only the
    /// winning call returns `true`.
    pub(crate) fn try_cancel(&self, cause: CancelCause) -> bool {
        if !self.cause.compare_and_swap(&None, Some(Arc::new(cause))) {
            return false;
        }
        self.done.close();
        true
    }

    /// Copy-on-write insert, de-duplicated by identity. Entries whose node has
    /// already been dropped are pruned on the way.
    pub(crate) fn add_child(&self, child: &Arc<Node>) -> bool {
        loop {
            let current = self.children.load();
            let list = current.as_deref().map(Vec::as_slice).unwrap_or_default();
            if list.iter().any(|entry| is_node(entry, child)) {
                return false;
            }

            let mut next: ChildList = list
                .iter()
                .filter(|entry| entry.strong_count() > 0)
                .cloned()
                .collect();
            next.push(Arc::downgrade(child));

            if self.children.compare_and_swap(&current, Some(Arc::new(next))) {
                return true;
            }
        }
    }

    /// Copy-on-write removal by identity.
    pub(crate) fn remove_child(&self, child: &Node) -> bool {
        loop {
            let current = self.children.load();
            let list = current.as_deref().map(Vec::as_slice).unwrap_or_default();
            if !list.iter().any(|entry| is_node(entry, child)) {
                return false;
            }

            let next: ChildList = list
                .iter()
                .filter(|entry| !is_node(entry, child) && entry.strong_count() > 0)
                .cloned()
                .collect();

            if self.children.compare_and_swap(&current, Some(Arc::new(next))) {
                return true;
            }
        }
    }

    /// Atomically empties the list and returns the live children it held.
    pub(crate) fn take_children(&self) -> Vec<Arc<Node>> {
        upgrade_all(self.children.swap(None))
    }

    pub(crate) fn children(&self) -> Vec<Arc<Node>> {
        upgrade_all(self.children.load())
    }
}

impl Drop for CancelState {
    fn drop(&mut self) {
        self.released.close();
    }
}

fn is_node(entry: &Weak<Node>, node: &Node) -> bool {
    std::ptr::eq(entry.as_ptr(), node)
}

fn upgrade_all(list: Option<Arc<ChildList>>) -> Vec<Arc<Node>> {
    list.map(|list| list.iter().filter_map(Weak::upgrade).collect())
        .unwrap_or_default()
}
