mod application;
mod cache;
mod config;
mod logger;
mod tests;

pub use application::{AppRegistry, Application};
pub use cache::{deferred, Cache, Compute, MemoryCache, SharedCache};
pub use config::{AppConfig, AppConfigBuilder};
pub use logger::{Logger, SharedLogger, TracingLogger};

#[cfg(test)]
pub use logger::MockLogger;
