//! Feed aggregation: fan out to every configured source, merge, sort, cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::sources::{SourceError, SourceProvider};
use crate::cache::{CacheError, CacheProvider};
use crate::domain::posts::NormalizedPost;

const METRIC_CACHE_HIT: &str = "dashboard_feed_cache_hit_total";
const METRIC_CACHE_MISS: &str = "dashboard_feed_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "dashboard_feed_cache_error_total";
const METRIC_SOURCE_ERROR: &str = "dashboard_feed_source_error_total";
const METRIC_FETCH_MS: &str = "dashboard_feed_fetch_ms";
const METRIC_POSTS: &str = "dashboard_feed_posts";

const SOURCE: &str = "creator_dashboard::feed";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub cache_key: String,
    pub ttl: Duration,
    /// Upper bound on each individual source fetch.
    pub fetch_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_key: "unified_feed".to_string(),
            ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_millis(8_000),
        }
    }
}

impl From<&crate::config::FeedSettings> for FeedConfig {
    fn from(settings: &crate::config::FeedSettings) -> Self {
        Self {
            cache_key: settings.cache_key.clone(),
            ttl: settings.ttl,
            fetch_timeout: settings.fetch_timeout,
        }
    }
}

pub struct FeedService {
    cache: Arc<CacheProvider>,
    sources: Vec<Arc<dyn SourceProvider>>,
    config: FeedConfig,
    refresh: Mutex<()>,
}

impl FeedService {
    pub fn new(
        cache: Arc<CacheProvider>,
        sources: Vec<Arc<dyn SourceProvider>>,
        config: FeedConfig,
    ) -> Self {
        Self {
            cache,
            sources,
            config,
            refresh: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Return the unified feed, from cache when fresh.
    ///
    /// Never fails: source failures contribute nothing and cache failures
    /// count as misses. Concurrent misses share one fetch.
    pub async fn get_unified_feed(&self) -> Vec<NormalizedPost> {
        if let Some(posts) = self.read_cache().await {
            counter!(METRIC_CACHE_HIT).increment(1);
            return posts;
        }
        counter!(METRIC_CACHE_MISS).increment(1);

        let _guard = self.refresh.lock().await;
        // Another caller may have filled the cache while we waited.
        if let Some(posts) = self.read_cache().await {
            return posts;
        }

        let posts = self.fetch_all().await;
        if let Err(error) = self
            .cache
            .set_json(&self.config.cache_key, &posts, self.config.ttl)
            .await
        {
            counter!(METRIC_CACHE_ERROR).increment(1);
            warn!(
                target = SOURCE,
                key = %self.config.cache_key,
                error = %error,
                "Failed to store unified feed"
            );
        }
        posts
    }

    /// Drop the cached feed. The next `get_unified_feed` refetches.
    pub async fn invalidate_feed_cache(&self) -> Result<(), FeedError> {
        self.cache.del(&self.config.cache_key).await?;
        info!(target = SOURCE, key = %self.config.cache_key, "Feed cache invalidated");
        Ok(())
    }

    async fn read_cache(&self) -> Option<Vec<NormalizedPost>> {
        match self
            .cache
            .get_json::<Vec<NormalizedPost>>(&self.config.cache_key)
            .await
        {
            Ok(hit) => hit,
            Err(error) => {
                counter!(METRIC_CACHE_ERROR).increment(1);
                warn!(
                    target = SOURCE,
                    key = %self.config.cache_key,
                    error = %error,
                    "Feed cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn fetch_all(&self) -> Vec<NormalizedPost> {
        let started_at = Instant::now();
        let timeout = self.config.fetch_timeout;

        let fetches = self.sources.iter().map(|provider| async move {
            let outcome = match tokio::time::timeout(timeout, provider.fetch_latest()).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            (provider.source(), outcome)
        });

        let mut batches = Vec::with_capacity(self.sources.len());
        for (source, outcome) in join_all(fetches).await {
            match outcome {
                Ok(posts) => {
                    debug!(target = SOURCE, source = source.as_str(), count = posts.len(), "Source fetched");
                    batches.push(posts);
                }
                Err(error) => {
                    counter!(METRIC_SOURCE_ERROR, "source" => source.as_str()).increment(1);
                    warn!(
                        target = SOURCE,
                        source = source.as_str(),
                        error = %error,
                        "Source fetch failed, skipping"
                    );
                }
            }
        }

        let posts = merge_posts(batches);
        histogram!(METRIC_FETCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        gauge!(METRIC_POSTS).set(posts.len() as f64);
        posts
    }
}

/// Concatenate per-source batches in order, keep the first post for each id,
/// then sort newest first. The sort is stable, so ties keep fetch order.
pub fn merge_posts(batches: Vec<Vec<NormalizedPost>>) -> Vec<NormalizedPost> {
    let mut seen = HashSet::new();
    let mut merged: Vec<NormalizedPost> = batches
        .into_iter()
        .flatten()
        .filter(|post| seen.insert(post.id.clone()))
        .collect();
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::{Duration as TimeDuration, OffsetDateTime};

    use super::*;
    use crate::domain::posts::FeedSource;

    fn post(source: FeedSource, local_id: &str, minutes_ago: i64) -> NormalizedPost {
        let base = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
        NormalizedPost {
            id: source.namespaced_id(local_id),
            title: format!("{local_id} title"),
            content: String::new(),
            source,
            url: format!("https://example.com/{local_id}"),
            author: None,
            thumbnail: None,
            upvotes: 0,
            published_at: base - TimeDuration::minutes(minutes_ago),
        }
    }

    struct StubSource {
        source: FeedSource,
        posts: Vec<NormalizedPost>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn ok(source: FeedSource, posts: Vec<NormalizedPost>) -> Arc<Self> {
            Arc::new(Self {
                source,
                posts,
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing(source: FeedSource) -> Arc<Self> {
            Arc::new(Self {
                source,
                posts: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceProvider for StubSource {
        fn source(&self) -> FeedSource {
            self.source
        }

        async fn fetch_latest(&self) -> Result<Vec<NormalizedPost>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Malformed("bad payload".into()));
            }
            Ok(self.posts.clone())
        }
    }

    fn service(cache: CacheProvider, sources: Vec<Arc<dyn SourceProvider>>) -> FeedService {
        FeedService::new(Arc::new(cache), sources, FeedConfig::default())
    }

    #[test]
    fn merge_dedupes_and_sorts_stably() {
        let reddit = vec![
            post(FeedSource::Reddit, "a", 10),
            post(FeedSource::Reddit, "b", 5),
        ];
        let twitter = vec![
            post(FeedSource::Twitter, "c", 5),
            post(FeedSource::Twitter, "d", 1),
        ];
        let duplicate = vec![post(FeedSource::Reddit, "a", 0)];

        let merged = merge_posts(vec![reddit, twitter, duplicate]);
        let ids: Vec<_> = merged.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["tw_d", "reddit_b", "tw_c", "reddit_a"]);
    }

    #[tokio::test]
    async fn broken_cache_degrades_to_fetching() {
        let source = StubSource::ok(FeedSource::Reddit, vec![post(FeedSource::Reddit, "a", 1)]);
        let feed = service(CacheProvider::broken(), vec![source.clone()]);

        assert_eq!(feed.get_unified_feed().await.len(), 1);
        assert_eq!(feed.get_unified_feed().await.len(), 1);
        assert_eq!(source.calls(), 2, "nothing cached, every call refetches");
    }

    #[tokio::test]
    async fn broken_cache_fails_invalidation() {
        let feed = service(CacheProvider::broken(), Vec::new());
        assert!(matches!(
            feed.invalidate_feed_cache().await,
            Err(FeedError::Cache(_))
        ));
    }

    #[tokio::test]
    async fn all_sources_failing_caches_empty_feed() {
        let source = StubSource::failing(FeedSource::Reddit);
        let feed = service(CacheProvider::in_process(), vec![source.clone()]);

        assert!(feed.get_unified_feed().await.is_empty());
        assert!(feed.get_unified_feed().await.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let source = StubSource::ok(FeedSource::Twitter, vec![post(FeedSource::Twitter, "x", 1)]);
        let feed = Arc::new(service(CacheProvider::in_process(), vec![source.clone()]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let feed = feed.clone();
                tokio::spawn(async move { feed.get_unified_feed().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.expect("join").len(), 1);
        }
        assert_eq!(source.calls(), 1);
    }
}
