use super::core::{Ctx, Node};
use crate::cell::AtomicRef;
use std::sync::Arc;

impl Ctx {
    /// A values-only copy of this context for work that outlives it.
    ///
    /// Lookups still walk up through this context, but the detached node has
    /// no deadline, no signal and no cause, and it is never registered as
    /// anyone's child. The application is resolved now and pinned on the new
    /// node.
    pub fn detach(&self) -> Ctx {
        let application = match self.application() {
            Some(app) => AtomicRef::new(Arc::new(app)),
            None => AtomicRef::empty(),
        };
        let node = Ctx(Arc::new(Node {
            detached: true,
            application,
            ..self.derive()
        }));
        tracing::trace!(node = %node.id(), from = %self.id(), "context detached");
        node
    }
}
