use std::any::Any;
use std::borrow::{Borrow, Cow};
use std::fmt::{Display, Formatter, Result};
use std::sync::Arc;

/// A value carried by a context. Values are shared, never copied.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Lookup key for a context value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    pub const fn from_static(name: &'static str) -> Self {
        Key(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Key {
    fn from(name: &'static str) -> Self {
        Key::from_static(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key(Cow::Owned(name))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.0)
    }
}
