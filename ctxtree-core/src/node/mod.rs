mod adapter;
mod context;
mod core;
mod detach;
mod request;
mod resolve;

pub use context::{Context, MAX_RESOLVE_DEPTH};
pub use self::core::{Ctx, NodeId};
pub use request::RequestScope;

pub(crate) use context::foreign_hop;
pub(crate) use self::core::{Node, Parent};
