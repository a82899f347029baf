mod atomic_ref;
mod tests;

pub use atomic_ref::AtomicRef;
