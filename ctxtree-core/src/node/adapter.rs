use super::context::Context;
use super::core::Ctx;
use super::request::RequestScope;
use crate::collab::AppRegistry;
use std::sync::Arc;

impl Ctx {
    /// Brings any context into the native tree.
    ///
    /// Native contexts are returned as they are and a [`RequestScope`] is
    /// unwrapped to the context it embeds. Anything else becomes the parent of
    /// a new native node, which follows the foreign context's cancellation if
    /// it has a signal.
    pub fn adapt(context: Arc<dyn Context>, registry: &AppRegistry) -> Ctx {
        if let Some(ctx) = context.as_any().downcast_ref::<Ctx>() {
            return ctx.clone();
        }
        if let Some(scope) = context.as_any().downcast_ref::<RequestScope>() {
            return scope.ctx().clone();
        }
        let ctx = Ctx::new_context(context, registry);
        tracing::debug!(node = %ctx.id(), "foreign context adapted");
        ctx
    }
}
