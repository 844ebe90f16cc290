//! Rate limiter behaviour in local mode and under store failure

use async_trait::async_trait;
use bulwark_domain::error::{Error, Result};
use bulwark_domain::ports::RateLimitBackend;
use bulwark_domain::value_objects::{RateLimitInfo, RateLimitSpec, ServiceMode};
use bulwark_infrastructure::config::{RateLimitConfig, StoreConfig};
use bulwark_infrastructure::rate_limit::RateLimiter;
use std::sync::Arc;

fn config_with(class: &str, spec: &str) -> RateLimitConfig {
    let mut config = RateLimitConfig::default();
    config.limits.insert(class.to_string(), spec.to_string());
    config
}

async fn local_limiter(config: &RateLimitConfig) -> RateLimiter {
    RateLimiter::new(config, &StoreConfig::default()).await.unwrap()
}

#[derive(Debug)]
struct UnreachableStore;

#[async_trait]
impl RateLimitBackend for UnreachableStore {
    async fn check(&self, _key: &str, _spec: &RateLimitSpec) -> Result<RateLimitInfo> {
        Err(Error::store("Redis EXEC timed out after 1000ms"))
    }
    async fn reset(&self, _key: &str) -> Result<()> {
        Err(Error::store("Redis DEL timed out after 1000ms"))
    }
    fn mode(&self) -> ServiceMode {
        ServiceMode::Shared
    }
    fn backend_name(&self) -> &str {
        "unreachable"
    }
}

#[tokio::test]
async fn test_fourth_request_in_a_second_is_rejected() {
    let limiter = local_limiter(&config_with("search", "3/minute")).await;
    assert_eq!(limiter.mode(), ServiceMode::Local);

    for remaining in [2, 1, 0] {
        let info = limiter.check("ip:1.2.3.4", "search").await;
        assert!(info.allowed);
        assert_eq!(info.limit, 3);
        assert_eq!(info.remaining, remaining);
    }

    let info = limiter.check("ip:1.2.3.4", "search").await;
    assert!(!info.allowed);
    assert!(info.retry_after.unwrap() > 0);

    let headers = info.headers();
    assert!(headers.iter().any(|(name, _)| *name == "Retry-After"));
    let body = info.rejection().unwrap();
    assert_eq!(body.status(), 429);
    assert_eq!(body.limit, 3);
    assert_eq!(body.window, 60);
}

#[tokio::test]
async fn test_identifiers_and_classes_are_isolated() {
    let limiter = local_limiter(&config_with("auth", "1/minute")).await;

    assert!(limiter.check("user:1", "auth").await.allowed);
    assert!(!limiter.check("user:1", "auth").await.allowed);
    assert!(limiter.check("user:2", "auth").await.allowed);
    assert!(limiter.check("user:1", "search").await.allowed);
}

#[tokio::test]
async fn test_unknown_class_uses_default_limit() {
    let limiter = local_limiter(&RateLimitConfig::default()).await;
    assert_eq!(limiter.spec_for("reports"), RateLimitSpec::new(100, 60));

    let info = limiter.check("ip:9.9.9.9", "reports").await;
    assert!(info.allowed);
    assert_eq!(info.limit, 100);
    assert_eq!(info.remaining, 99);
}

#[tokio::test]
async fn test_per_call_limit_overrides_the_table() {
    let limiter = local_limiter(&RateLimitConfig::default()).await;
    let custom = Some(RateLimitSpec::new(1, 10));

    let first = limiter.check_with("api-key:7", "export", custom).await;
    assert!(first.allowed);
    assert_eq!(first.window_secs, 10);

    let second = limiter.check_with("api-key:7", "export", custom).await;
    assert!(!second.allowed);
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let config = RateLimitConfig {
        enabled: false,
        ..config_with("auth", "2/minute")
    };
    let limiter = local_limiter(&config).await;
    assert!(!limiter.is_enabled());

    for _ in 0..10 {
        let info = limiter.check("user:1", "auth").await;
        assert!(info.allowed);
        assert_eq!(info.remaining, 2);
    }
}

#[tokio::test]
async fn test_reset_restores_the_budget() {
    let limiter = local_limiter(&config_with("upload", "1/hour")).await;
    assert!(limiter.check("user:1", "upload").await.allowed);
    assert!(!limiter.check("user:1", "upload").await.allowed);

    assert!(limiter.reset("user:1", "upload").await);
    assert!(limiter.check("user:1", "upload").await.allowed);
}

#[tokio::test]
async fn test_store_failure_admits_with_full_budget() {
    let config = config_with("auth", "5/minute");
    let limiter = RateLimiter::with_backend(Arc::new(UnreachableStore), &config).unwrap();

    let info = limiter.check("user:1", "auth").await;
    assert!(info.allowed);
    assert_eq!(info.remaining, 5);
    assert_eq!(info.retry_after, None);
    assert!(!limiter.reset("user:1", "auth").await);
}

#[tokio::test]
async fn test_unknown_unit_fails_construction() {
    let err = RateLimiter::new(&config_with("search", "3/fortnight"), &StoreConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_limits_table_includes_overrides_and_builtins() {
    let limiter = local_limiter(&config_with("export", "2/day")).await;
    let limits = limiter.limits();
    assert_eq!(limits["export"], RateLimitSpec::new(2, 86_400));
    assert_eq!(limits["webhook"], RateLimitSpec::new(1000, 60));
}
