//! Content-source seam for the feed aggregator.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::posts::{FeedSource, NormalizedPost};

/// A single source fetch that failed. Always recovered by the aggregator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("unexpected status {status}")]
    Status { status: u16 },
    #[error("timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn source(&self) -> FeedSource;

    /// Fetch the latest items, already normalized.
    async fn fetch_latest(&self) -> Result<Vec<NormalizedPost>, SourceError>;
}
