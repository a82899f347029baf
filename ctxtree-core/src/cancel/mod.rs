mod handle;
mod propagate;
mod signal;
mod state;

pub use handle::CancelHandle;
pub use signal::{Signal, SignalSource};

pub(crate) use propagate::{arm_deadline, propagate};
pub(crate) use state::CancelState;
