mod error;
mod key;
mod result;

pub use error::{CancelCause, ContextError};
pub use key::{Key, Value};
pub use result::ContextResult;
