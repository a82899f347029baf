use crate::types::ContextResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_NAME: &str = "app";
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Configuration for an application handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name attached to the application's root logger
    pub name: String,
    /// Deadline given to each request scope, in seconds
    pub request_timeout: u64,
    /// Maximum number of entries held by the application cache
    pub cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> ContextResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Builder for application configuration
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.config.request_timeout = seconds;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
