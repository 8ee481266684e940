//! Key-value cache with TTL for the dashboard.
//!
//! The backend is chosen once at startup. When a networked store is configured
//! the provider makes a single connection attempt; if that fails it degrades to
//! the in-process store for the rest of the process lifetime and says so once.
//!
//! ```toml
//! [cache]
//! redis_url = "redis://127.0.0.1:6379"
//! connect_timeout_ms = 1500
//! ```

mod config;
mod lock;
mod memory;
mod networked;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

pub use config::CacheConfig;
pub use memory::InProcessStore;
pub use networked::NetworkedStore;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The networked store errored after a successful connection.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Networked,
    InProcess,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Networked => "networked",
            Self::InProcess => "in_process",
        }
    }
}

pub enum CacheBackend {
    Networked(NetworkedStore),
    InProcess(InProcessStore),
    /// A connected backend whose every call fails.
    #[cfg(test)]
    Broken,
}

/// Cache handle shared by the feed aggregator.
pub struct CacheProvider {
    backend: CacheBackend,
}

impl CacheProvider {
    /// Select a backend. Never fails: an unreachable networked store yields the
    /// in-process backend.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!(
                target = "creator_dashboard::cache",
                backend = BackendKind::InProcess.as_str(),
                "No networked cache configured"
            );
            return Self::in_process();
        };

        match NetworkedStore::connect(url, config.connect_timeout).await {
            Ok(store) => {
                info!(
                    target = "creator_dashboard::cache",
                    backend = BackendKind::Networked.as_str(),
                    "Connected to networked cache"
                );
                Self {
                    backend: CacheBackend::Networked(store),
                }
            }
            Err(error) => {
                warn!(
                    target = "creator_dashboard::cache",
                    error = %error,
                    fallback = BackendKind::InProcess.as_str(),
                    "Networked cache unreachable, using in-process cache for this process"
                );
                Self::in_process()
            }
        }
    }

    pub fn in_process() -> Self {
        Self {
            backend: CacheBackend::InProcess(InProcessStore::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn broken() -> Self {
        Self {
            backend: CacheBackend::Broken,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        match &self.backend {
            CacheBackend::Networked(_) => BackendKind::Networked,
            CacheBackend::InProcess(_) => BackendKind::InProcess,
            #[cfg(test)]
            CacheBackend::Broken => BackendKind::Networked,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match &self.backend {
            CacheBackend::Networked(store) => store.get(key).await,
            CacheBackend::InProcess(store) => Ok(store.get(key)),
            #[cfg(test)]
            CacheBackend::Broken => Err(CacheError::unavailable("broken backend")),
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        match &self.backend {
            CacheBackend::Networked(store) => store.set(key, &value, ttl).await,
            CacheBackend::InProcess(store) => {
                store.set(key, value, ttl);
                Ok(())
            }
            #[cfg(test)]
            CacheBackend::Broken => Err(CacheError::unavailable("broken backend")),
        }
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        match &self.backend {
            CacheBackend::Networked(store) => store.del(key).await,
            CacheBackend::InProcess(store) => {
                store.del(key);
                Ok(())
            }
            #[cfg(test)]
            CacheBackend::Broken => Err(CacheError::unavailable("broken backend")),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_selects_in_process() {
        let provider = CacheProvider::connect(&CacheConfig::in_process()).await;
        assert_eq!(provider.backend_kind(), BackendKind::InProcess);
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_in_process() {
        let config = CacheConfig {
            redis_url: Some("redis://127.0.0.1:1/".into()),
            connect_timeout: Duration::from_millis(200),
        };
        let provider = CacheProvider::connect(&config).await;
        assert_eq!(provider.backend_kind(), BackendKind::InProcess);

        provider
            .set("k", "v".into(), Duration::from_secs(5))
            .await
            .expect("in-process set");
        assert_eq!(provider.get("k").await.expect("get").as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn dropped_connection_is_not_retried() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let accepts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepts);
        let server = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
        });

        let config = CacheConfig {
            redis_url: Some(format!("redis://{addr}/")),
            connect_timeout: Duration::from_millis(1500),
        };
        let provider = CacheProvider::connect(&config).await;
        assert_eq!(provider.backend_kind(), BackendKind::InProcess);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
        server.abort();
    }

    #[tokio::test]
    async fn invalid_url_falls_back_to_in_process() {
        let provider = CacheProvider::connect(&CacheConfig::networked("not a url")).await;
        assert_eq!(provider.backend_kind(), BackendKind::InProcess);
    }

    #[tokio::test]
    async fn json_helpers_round_trip_values() {
        let provider = CacheProvider::in_process();
        provider
            .set_json("list", &vec![1_u32, 2, 3], Duration::from_secs(5))
            .await
            .expect("set json");
        let loaded: Option<Vec<u32>> = provider.get_json("list").await.expect("get json");
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        provider.del("list").await.expect("del");
        let loaded: Option<Vec<u32>> = provider.get_json("list").await.expect("get json");
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn corrupt_value_surfaces_serialization_error() {
        let provider = CacheProvider::in_process();
        provider
            .set("list", "not json".into(), Duration::from_secs(5))
            .await
            .expect("set");
        let result: Result<Option<Vec<u32>>, _> = provider.get_json("list").await;
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[tokio::test]
    async fn broken_backend_propagates_errors() {
        let provider = CacheProvider::broken();
        assert!(matches!(
            provider.get("k").await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(provider.del("k").await.is_err());
    }
}
