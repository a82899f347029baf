use super::context::Context;
use super::core::Ctx;
use crate::cancel::{CancelHandle, Signal};
use crate::collab::{AppConfig, Application, SharedCache, SharedLogger};
use crate::types::{CancelCause, Key, Value};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Context of a single request: a native node plus request metadata.
#[derive(Debug, Clone)]
pub struct RequestScope {
    ctx: Ctx,
    request_id: Uuid,
    method: String,
    path: String,
    started_at: DateTime<Utc>,
}

impl RequestScope {
    /// Opens a request under `parent`.
    ///
    /// The scope expires after the application's request timeout and logs
    /// through a child logger tagged with the request fields.
    pub fn begin(
        parent: &Ctx,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> (Self, CancelHandle) {
        let request_id = Uuid::new_v4();
        let method = method.into();
        let path = path.into();

        let timeout = parent
            .application()
            .map(|app| app.config().request_timeout())
            .unwrap_or_else(|| AppConfig::default().request_timeout());
        let logger = parent
            .logger()
            .with_field("request_id", &request_id.to_string())
            .with_field("method", &method)
            .with_field("path", &path);

        let (ctx, cancel) = parent.with_logger(logger).with_timeout(timeout);
        let scope = Self {
            ctx,
            request_id,
            method,
            path,
            started_at: Utc::now(),
        };
        (scope, cancel)
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Context for RequestScope {
    fn deadline(&self) -> Option<Instant> {
        self.ctx.deadline()
    }

    fn done(&self) -> Option<Signal> {
        self.ctx.done()
    }

    fn err(&self) -> Option<CancelCause> {
        self.ctx.err()
    }

    fn value(&self, key: &Key) -> Option<Value> {
        self.ctx.value(key)
    }

    fn lookup_logger(&self) -> Option<SharedLogger> {
        self.ctx.lookup_logger()
    }

    fn lookup_cache(&self) -> Option<SharedCache> {
        self.ctx.lookup_cache()
    }

    fn lookup_application(&self) -> Option<Arc<Application>> {
        self.ctx.lookup_application()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
