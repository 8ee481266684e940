use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::credits::UserId;
use super::error::DomainError;
use super::posts::FeedSource;

/// Shortest accepted report reason, in characters after trimming.
pub const MIN_REASON_CHARS: usize = 5;

/// Moderation state of a report. New reports start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(DomainError::invariant(format!(
                "unknown report status `{other}`"
            ))),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's flag on a feed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: i64,
    pub user_id: UserId,
    pub post_id: String,
    pub title: Option<String>,
    pub source: FeedSource,
    pub url: Option<String>,
    pub reason: String,
    pub status: ReportStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub post_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub source: FeedSource,
    #[serde(default)]
    pub url: Option<String>,
    pub reason: String,
}

impl NewReport {
    /// Trim the free-text fields and reject empty post ids or short reasons.
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.post_id = self.post_id.trim().to_string();
        self.reason = self.reason.trim().to_string();
        if self.post_id.is_empty() {
            return Err(DomainError::validation("postId is required"));
        }
        if self.reason.chars().count() < MIN_REASON_CHARS {
            return Err(DomainError::validation(format!(
                "reason must be at least {MIN_REASON_CHARS} characters"
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(post_id: &str, reason: &str) -> NewReport {
        NewReport {
            post_id: post_id.to_string(),
            title: None,
            source: FeedSource::Reddit,
            url: None,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn validation_trims_and_accepts_reasonable_reports() {
        let valid = report(" reddit_abc ", "  spam link  ").validated().unwrap();
        assert_eq!(valid.post_id, "reddit_abc");
        assert_eq!(valid.reason, "spam link");
    }

    #[test]
    fn short_reasons_and_blank_post_ids_are_rejected() {
        assert!(matches!(
            report("reddit_abc", " spam ").validated(),
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            report("   ", "misleading title").validated(),
            Err(DomainError::Validation { .. })
        ));
        // Length counts characters, not bytes.
        assert!(report("reddit_abc", "ñññññ").validated().is_ok());
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Reviewed,
            ReportStatus::Dismissed,
        ] {
            assert_eq!(ReportStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ReportStatus::parse("closed").is_err());
    }
}
