//! Redis-backed store.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use tracing::debug;

use super::CacheError;

#[derive(Clone)]
pub struct NetworkedStore {
    conn: MultiplexedConnection,
}

impl NetworkedStore {
    /// Make exactly one connection attempt, bounded by `timeout`, and verify it with `PING`.
    ///
    /// The multiplexed connection does not reconnect on its own, so a refused or
    /// dropped socket fails the attempt instead of being retried.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::unavailable(format!("invalid redis url: {e}")))?;

        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                CacheError::unavailable(format!(
                    "connect timed out after {} ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|e| CacheError::unavailable(format!("connect failed: {e}")))?;

        let mut handshake = conn.clone();
        let pong = tokio::time::timeout(
            timeout,
            redis::cmd("PING").query_async::<_, String>(&mut handshake),
        )
        .await
        .map_err(|_| CacheError::unavailable("PING timed out"))?
        .map_err(|e| CacheError::unavailable(format!("PING failed: {e}")))?;
        debug!(target = "creator_dashboard::cache", reply = %pong, "redis handshake");

        Ok(Self { conn })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| CacheError::unavailable(format!("GET {key} failed: {e}")))
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::unavailable(format!("SET {key} failed: {e}")))
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::unavailable(format!("DEL {key} failed: {e}")))
    }
}
