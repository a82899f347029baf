//! Request-scoped execution contexts: values carried down a call tree,
//! cancellation and deadlines propagated from ancestors to descendants, and
//! detached copies for work that outlives its caller.

pub mod cancel;
pub mod cell;
pub mod collab;
pub mod node;
pub mod types;

pub mod prelude {
    //! Convenient re-exports of commonly used types
    pub use crate::cancel::{CancelHandle, Signal, SignalSource};
    pub use crate::cell::AtomicRef;
    pub use crate::collab::{
        deferred, AppConfig, AppConfigBuilder, AppRegistry, Application, Cache, Compute, Logger,
        MemoryCache, SharedCache, SharedLogger, TracingLogger,
    };
    pub use crate::node::{Context, Ctx, NodeId, RequestScope, MAX_RESOLVE_DEPTH};
    pub use crate::types::{CancelCause, ContextError, ContextResult, Key, Value};
}

// Re-export main types
pub use prelude::*;
