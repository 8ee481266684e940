//! Networked cache tests against a running Redis.
//!
//! - Marked `#[ignore]`; run with `DASHBOARD_TEST_REDIS_URL` pointing at a
//!   disposable instance.

use std::time::Duration;

use creator_dashboard::cache::{BackendKind, CacheConfig, CacheProvider};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

fn redis_url() -> String {
    std::env::var("DASHBOARD_TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into())
}

#[tokio::test]
#[ignore]
async fn live_redis_round_trips_and_expires() -> TestResult<()> {
    let provider = CacheProvider::connect(&CacheConfig::networked(redis_url())).await;
    assert_eq!(provider.backend_kind(), BackendKind::Networked);

    let key = format!("dashboard-test-{}", uuid::Uuid::new_v4());
    provider
        .set(&key, "payload".to_string(), Duration::from_millis(300))
        .await?;
    assert_eq!(provider.get(&key).await?.as_deref(), Some("payload"));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(provider.get(&key).await?, None);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_redis_delete_is_immediate() -> TestResult<()> {
    let provider = CacheProvider::connect(&CacheConfig::networked(redis_url())).await;
    let key = format!("dashboard-test-{}", uuid::Uuid::new_v4());

    provider
        .set_json(&key, &vec![1, 2, 3], Duration::from_secs(60))
        .await?;
    provider.del(&key).await?;
    assert_eq!(provider.get_json::<Vec<i32>>(&key).await?, None);
    Ok(())
}
