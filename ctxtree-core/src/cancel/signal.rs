use std::fmt::{Debug, Formatter, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Read side of a one-shot broadcast completion signal.
///
/// Every waiter, past or future, observes the close. Cloning yields another
/// handle to the same signal. Only the owning [`SignalSource`] can close it.
///
/// ```compile_fail
/// use ctxtree_core::prelude::*;
///
/// let (ctx, _cancel) = Ctx::background().with_cancel();
/// ctx.done().unwrap().close();
/// ```
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    closed: AtomicBool,
    notify: Notify,
}

impl Signal {
    fn open() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Waits until the signal is closed.
    pub async fn wait(&self) {
        if self.is_closed() {
            return;
        }
        // A `Notified` created before `notify_waiters` runs is guaranteed to
        // be woken, so the flag must be re-checked only after creating it.
        let notified = self.inner.notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this signal, its source included.
    #[cfg(test)]
    pub(crate) fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Debug for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Signal")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owner of a [`Signal`], the only handle able to close it.
///
/// Foreign context implementations keep one of these and hand out
/// [`SignalSource::signal`] from their `done()`.
pub struct SignalSource {
    signal: Signal,
}

impl SignalSource {
    pub fn new() -> Self {
        Self {
            signal: Signal::open(),
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }

    /// Closes the signal and wakes every waiter. Returns `false` if it was
    /// already closed.
    pub fn close(&self) -> bool {
        let inner = &self.signal.inner;
        if inner.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        inner.notify.notify_waiters();
        true
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SignalSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_tuple("SignalSource").field(&self.signal).finish()
    }
}
