use arc_swap::ArcSwapOption;
use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;

/// A lock-free box holding at most one shared value.
///
/// Every mutation is a single atomic operation on the underlying pointer, so
/// readers never block and never observe a torn value. Comparison in
/// [`AtomicRef::compare_and_swap`] is by pointer identity, not by value.
pub struct AtomicRef<T> {
    inner: ArcSwapOption<T>,
}

impl<T> AtomicRef<T> {
    pub fn empty() -> Self {
        Self {
            inner: ArcSwapOption::empty(),
        }
    }

    pub fn new(value: Arc<T>) -> Self {
        Self {
            inner: ArcSwapOption::new(Some(value)),
        }
    }

    pub fn load(&self) -> Option<Arc<T>> {
        self.inner.load_full()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_none()
    }

    pub fn store(&self, value: Option<Arc<T>>) {
        self.inner.store(value);
    }

    /// Replaces the content and returns what was there before.
    pub fn swap(&self, value: Option<Arc<T>>) -> Option<Arc<T>> {
        self.inner.swap(value)
    }

    /// Installs `new` if the cell still holds `current`.
    ///
    /// Returns `true` when this call performed the swap.
    pub fn compare_and_swap(&self, current: &Option<Arc<T>>, new: Option<Arc<T>>) -> bool {
        let previous = self.inner.compare_and_swap(current, new);
        same(&*previous, current)
    }

    /// Publishes `value` only if the cell is empty. The first writer wins and
    /// every caller gets the winning value back.
    pub fn get_or_publish(&self, value: Arc<T>) -> Arc<T> {
        loop {
            let current = self.inner.load_full();
            if let Some(existing) = current {
                return existing;
            }
            if self.compare_and_swap(&None, Some(Arc::clone(&value))) {
                return value;
            }
        }
    }
}

impl<T> Default for AtomicRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Debug> Debug for AtomicRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_tuple("AtomicRef").field(&self.load()).finish()
    }
}

fn same<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
