use super::propagate::cancel;
use crate::node::Ctx;
use crate::types::CancelCause;
use std::fmt::{Debug, Formatter, Result};

/// Cancels the context it was created with.
///
/// Cloning shares the same target; dropping the handle does not cancel.
#[derive(Clone)]
pub struct CancelHandle {
    ctx: Ctx,
}

impl CancelHandle {
    pub(crate) fn new(ctx: &Ctx) -> Self {
        Self { ctx: ctx.clone() }
    }

    /// Cancels with [`CancelCause::Canceled`]. Returns `true` if this call
    /// performed the transition.
    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelCause::Canceled)
    }

    /// Cancels with a caller-supplied cause.
    pub fn cancel_with(&self, cause: CancelCause) -> bool {
        cancel(&self.ctx.0, cause, true)
    }
}

impl Debug for CancelHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("CancelHandle")
            .field("node", &self.ctx.id())
            .finish()
    }
}
