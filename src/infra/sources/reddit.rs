use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    application::sources::{SourceError, SourceProvider},
    config::FeedSettings,
    domain::posts::{
        FeedSource, NormalizedPost, clamp_upvotes, sanitize_thumbnail, truncate_content,
    },
};

const PERMALINK_HOST: &str = "https://reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    ups: i64,
    created_utc: f64,
}

/// Hot posts from a fixed list of subreddits.
pub struct RedditSource {
    client: reqwest::Client,
    base_url: String,
    subreddits: Vec<String>,
    limit: u32,
    content_limit: usize,
    timeout_ms: u64,
}

impl RedditSource {
    pub fn new(client: reqwest::Client, settings: &FeedSettings) -> Self {
        Self {
            client,
            base_url: settings.reddit_base_url.trim_end_matches('/').to_string(),
            subreddits: settings.subreddits.clone(),
            limit: settings.reddit_limit,
            content_limit: settings.content_limit,
            timeout_ms: u64::try_from(settings.fetch_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<NormalizedPost>, SourceError> {
        let url = format!(
            "{}/r/{subreddit}/hot.json?limit={}",
            self.base_url, self.limit
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;
        parse_listing(&body, self.content_limit)
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                after_ms: self.timeout_ms,
            }
        } else if err.is_decode() {
            SourceError::Malformed(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

#[async_trait]
impl SourceProvider for RedditSource {
    fn source(&self) -> FeedSource {
        FeedSource::Reddit
    }

    /// Subreddits are fetched concurrently; a failing one is skipped. The
    /// source only fails when every subreddit did.
    async fn fetch_latest(&self) -> Result<Vec<NormalizedPost>, SourceError> {
        let results = join_all(self.subreddits.iter().map(|sub| async move {
            (sub.as_str(), self.fetch_subreddit(sub).await)
        }))
        .await;

        let mut posts = Vec::new();
        let mut first_error = None;
        let mut succeeded = 0_usize;
        for (subreddit, result) in results {
            match result {
                Ok(batch) => {
                    succeeded += 1;
                    posts.extend(batch);
                }
                Err(error) => {
                    warn!(
                        target = "creator_dashboard::sources::reddit",
                        subreddit,
                        error = %error,
                        "Subreddit fetch failed"
                    );
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) if succeeded == 0 => Err(error),
            _ => Ok(posts),
        }
    }
}

/// Normalize one `hot.json` listing body.
pub fn parse_listing(body: &str, content_limit: usize) -> Result<Vec<NormalizedPost>, SourceError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    listing
        .data
        .children
        .into_iter()
        .map(|child| normalize(child.data, content_limit))
        .collect()
}

fn normalize(raw: RawPost, content_limit: usize) -> Result<NormalizedPost, SourceError> {
    let published_at = OffsetDateTime::from_unix_timestamp(raw.created_utc.trunc() as i64)
        .map_err(|e| SourceError::Malformed(format!("created_utc {}: {e}", raw.created_utc)))?;

    let content = if raw.selftext.is_empty() {
        raw.title.clone()
    } else {
        truncate_content(&raw.selftext, content_limit)
    };

    Ok(NormalizedPost {
        id: FeedSource::Reddit.namespaced_id(&raw.id),
        content,
        url: format!("{PERMALINK_HOST}{}", raw.permalink),
        author: raw.author,
        thumbnail: sanitize_thumbnail(raw.thumbnail.as_deref()),
        upvotes: clamp_upvotes(raw.ups),
        published_at,
        title: raw.title,
        source: FeedSource::Reddit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {"kind": "t3", "data": {
                    "id": "abc", "title": "Link post", "selftext": "",
                    "permalink": "/r/programming/comments/abc/link_post/",
                    "author": "alice", "thumbnail": "self", "ups": 42,
                    "created_utc": 1700000000.0
                }},
                {"kind": "t3", "data": {
                    "id": "def", "title": "Text post", "selftext": "0123456789",
                    "permalink": "/r/programming/comments/def/text_post/",
                    "author": "bob", "thumbnail": "https://b.thumbs.redditmedia.com/x.jpg",
                    "ups": -3, "created_utc": 1700000100.5
                }}
            ]
        }
    }"#;

    #[test]
    fn listing_maps_to_normalized_posts() {
        let posts = parse_listing(LISTING, 4).expect("parse");
        assert_eq!(posts.len(), 2);

        let link = &posts[0];
        assert_eq!(link.id, "reddit_abc");
        assert_eq!(link.content, "Link post");
        assert_eq!(
            link.url,
            "https://reddit.com/r/programming/comments/abc/link_post/"
        );
        assert_eq!(link.thumbnail, None);
        assert_eq!(link.upvotes, 42);
        assert_eq!(link.published_at.unix_timestamp(), 1_700_000_000);

        let text = &posts[1];
        assert_eq!(text.content, "0123");
        assert_eq!(
            text.thumbnail.as_deref(),
            Some("https://b.thumbs.redditmedia.com/x.jpg")
        );
        assert_eq!(text.upvotes, 0);
        assert_eq!(text.author.as_deref(), Some("bob"));
    }

    #[test]
    fn malformed_body_is_reported() {
        let err = parse_listing("<html>rate limited</html>", 400).expect_err("not json");
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
