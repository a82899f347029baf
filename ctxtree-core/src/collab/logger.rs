use std::fmt::Debug;
use std::sync::Arc;
use tracing::Level;

pub type SharedLogger = Arc<dyn Logger>;

/// Structured logging capability carried by a context
#[cfg_attr(test, mockall::automock)]
pub trait Logger: Send + Sync + Debug {
    /// Derive a child logger that carries one more field
    fn with_field(&self, key: &str, value: &str) -> SharedLogger;

    fn log(&self, level: Level, message: &str);

    /// Fields accumulated by this logger, oldest first
    fn fields(&self) -> Vec<(String, String)>;
}

/// Logger that forwards to `tracing` events
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    fields: Vec<(String, String)>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLogger {
        Arc::new(Self::new())
    }

    fn rendered_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Logger for TracingLogger {
    fn with_field(&self, key: &str, value: &str) -> SharedLogger {
        let mut fields = self.fields.clone();
        fields.push((key.to_string(), value.to_string()));
        Arc::new(Self { fields })
    }

    fn log(&self, level: Level, message: &str) {
        let fields = self.rendered_fields();
        // tracing macros need the level at compile time
        match level {
            Level::ERROR => tracing::error!(%fields, "{}", message),
            Level::WARN => tracing::warn!(%fields, "{}", message),
            Level::INFO => tracing::info!(%fields, "{}", message),
            Level::DEBUG => tracing::debug!(%fields, "{}", message),
            _ => tracing::trace!(%fields, "{}", message),
        }
    }

    fn fields(&self) -> Vec<(String, String)> {
        self.fields.clone()
    }
}
