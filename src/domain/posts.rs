//! Normalized feed posts shared by every content source.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use super::error::DomainError;

/// Known content origins. Post ids are namespaced by the origin's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Reddit,
    Twitter,
    Linkedin,
}

impl FeedSource {
    pub const ALL: [FeedSource; 3] = [FeedSource::Reddit, FeedSource::Twitter, FeedSource::Linkedin];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedSource::Reddit => "reddit",
            FeedSource::Twitter => "twitter",
            FeedSource::Linkedin => "linkedin",
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            FeedSource::Reddit => "reddit_",
            FeedSource::Twitter => "tw_",
            FeedSource::Linkedin => "li_",
        }
    }

    /// Build a globally unique post id from a source-local identifier.
    pub fn namespaced_id(self, local_id: &str) -> String {
        format!("{}{local_id}", self.id_prefix())
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSource {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reddit" => Ok(FeedSource::Reddit),
            "twitter" => Ok(FeedSource::Twitter),
            "linkedin" => Ok(FeedSource::Linkedin),
            other => Err(DomainError::validation(format!(
                "unknown feed source `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: FeedSource,
    pub url: String,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub upvotes: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// Cut `text` down to at most `limit` characters without splitting a code point.
pub fn truncate_content(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Keep a thumbnail only when it is an absolute http(s) URL.
///
/// Sources emit placeholder values such as `self`, `default` or `nsfw`; those
/// collapse to `None`. Accepted values are returned as given, minus surrounding
/// whitespace.
pub fn sanitize_thumbnail(raw: Option<&str>) -> Option<String> {
    let candidate = raw?.trim();
    let parsed = Url::parse(candidate).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Some(candidate.to_string()),
        _ => None,
    }
}

/// Convert a signed vote count into the non-negative representation posts carry.
pub fn clamp_upvotes(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_content("héllo wörld", 4), "héll");
        assert_eq!(truncate_content("short", 400), "short");
        assert_eq!(truncate_content("", 3), "");
    }

    #[test]
    fn thumbnails_must_be_absolute_http_urls() {
        assert_eq!(
            sanitize_thumbnail(Some("https://i.redd.it/abc.png")).as_deref(),
            Some("https://i.redd.it/abc.png")
        );
        assert_eq!(sanitize_thumbnail(Some("self")), None);
        assert_eq!(sanitize_thumbnail(Some("default")), None);
        assert_eq!(sanitize_thumbnail(Some("ftp://example.com/a.png")), None);
        assert_eq!(sanitize_thumbnail(Some("/relative/path.png")), None);
        assert_eq!(sanitize_thumbnail(None), None);
    }

    #[test]
    fn accepted_thumbnails_are_not_normalised() {
        assert_eq!(
            sanitize_thumbnail(Some("https://img.example")).as_deref(),
            Some("https://img.example")
        );
        assert_eq!(
            sanitize_thumbnail(Some("  https://I.Example/a b.png ")).as_deref(),
            Some("https://I.Example/a b.png")
        );
    }

    #[test]
    fn sources_parse_case_insensitively() {
        assert_eq!("Reddit".parse::<FeedSource>().unwrap(), FeedSource::Reddit);
        assert_eq!(" linkedin ".parse::<FeedSource>().unwrap(), FeedSource::Linkedin);
        assert!("mastodon".parse::<FeedSource>().is_err());
    }

    #[test]
    fn namespaced_ids_carry_source_prefix() {
        assert_eq!(FeedSource::Reddit.namespaced_id("x1"), "reddit_x1");
        assert_eq!(FeedSource::Twitter.namespaced_id("001"), "tw_001");
    }

    #[test]
    fn negative_votes_clamp_to_zero() {
        assert_eq!(clamp_upvotes(-5), 0);
        assert_eq!(clamp_upvotes(42), 42);
    }

    #[test]
    fn posts_serialize_with_camel_case_rfc3339_timestamps() {
        let post = NormalizedPost {
            id: "tw_1".into(),
            title: "t".into(),
            content: "c".into(),
            source: FeedSource::Twitter,
            url: "https://twitter.com/i/web/status/1".into(),
            author: None,
            thumbnail: None,
            upvotes: 3,
            published_at: time::macros::datetime!(2024-05-01 12:00 UTC),
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["publishedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["source"], "twitter");
    }
}
