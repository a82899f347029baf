#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::types::{ContextError, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Level;

    #[test]
    fn test_config_defaults_and_builder() {
        let config = AppConfig::default();
        assert_eq!(config.name, "app");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_capacity, 1024);

        let config = AppConfigBuilder::new()
            .name("orders")
            .request_timeout(5)
            .cache_capacity(16)
            .build();
        assert_eq!(config.name, "orders");
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.cache_capacity, 16);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = AppConfig::from_json(r#"{"name": "billing", "request_timeout": 2}"#).unwrap();
        assert_eq!(config.name, "billing");
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.cache_capacity, AppConfig::default().cache_capacity);
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let err = AppConfig::from_json(r#"{"request_timeout": "soon"}"#).unwrap_err();
        assert!(matches!(err, ContextError::Config(_)));
    }

    #[test]
    fn test_tracing_logger_accumulates_fields() {
        let root = TracingLogger::shared();
        let child = root.with_field("request_id", "r-1").with_field("user", "ada");

        assert!(root.fields().is_empty());
        assert_eq!(
            child.fields(),
            vec![
                ("request_id".to_string(), "r-1".to_string()),
                ("user".to_string(), "ada".to_string()),
            ]
        );

        // Emitting must not panic without a subscriber
        child.log(Level::INFO, "handled");
        child.log(Level::TRACE, "details");
    }

    #[test]
    fn test_mock_logger_receives_level() {
        let mut logger = MockLogger::new();
        logger
            .expect_log()
            .withf(|level, message| *level == Level::WARN && message == "slow")
            .times(1)
            .return_const(());

        let shared: SharedLogger = Arc::new(logger);
        shared.log(Level::WARN, "slow");
    }

    #[test]
    fn test_memory_cache_capacity() {
        let cache = MemoryCache::new(2);
        cache.set("a", Arc::new(1));
        cache.set("b", Arc::new(2));
        cache.set("c", Arc::new(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("c").is_none());

        // Overwriting an existing key is always allowed
        cache.set("a", Arc::new(10));
        let a = cache.get("a").unwrap();
        assert_eq!(a.downcast_ref::<i32>(), Some(&10));

        assert!(cache.remove("a").is_some());
        assert!(cache.remove("a").is_none());
        cache.set("c", Arc::new(3));
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn test_fetch_computes_once() {
        let cache = MemoryCache::shared(8);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .fetch(
                    "greeting",
                    deferred(async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(Arc::new("hello") as Value)
                    }),
                )
                .await
                .unwrap();
            assert_eq!(value.downcast_ref::<&str>(), Some(&"hello"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_stored() {
        let cache = MemoryCache::new(8);
        let err = cache
            .fetch(
                "broken",
                deferred(async { Err(ContextError::Cache("backend down".into())) }),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Cache: backend down");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_application_owns_logger_and_cache() {
        let app = Application::new(AppConfigBuilder::new().name("shop").build());
        assert_eq!(app.name(), "shop");
        assert_eq!(
            app.logger().fields(),
            vec![("app".to_string(), "shop".to_string())]
        );
        assert!(Arc::ptr_eq(&app.cache(), &app.cache()));
        assert!(format!("{:?}", app).contains("shop"));
    }

    #[test]
    fn test_registry_set_and_clear() {
        let registry = AppRegistry::new();
        assert!(registry.current().is_none());

        let first = Application::new(AppConfig::default());
        let second = Application::new(AppConfig::default());
        assert!(registry.set(Arc::clone(&first)).is_none());

        let replaced = registry.set(Arc::clone(&second)).unwrap();
        assert_eq!(replaced.id(), first.id());

        // Clones share one slot
        let clone = registry.clone();
        assert!(clone.ptr_eq(&registry));
        assert_eq!(clone.current().unwrap().id(), second.id());

        assert!(registry.clear().is_some());
        assert!(clone.current().is_none());
    }
}
