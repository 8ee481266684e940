use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::credits::UserId;
use super::posts::FeedSource;

/// A feed post bookmarked by a user. `(user_id, post_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostRecord {
    pub id: i64,
    pub user_id: UserId,
    pub post_id: String,
    pub title: String,
    pub content: Option<String>,
    pub source: FeedSource,
    pub url: String,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub upvotes: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePostParams {
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub source: FeedSource,
    pub url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub upvotes: u64,
}
