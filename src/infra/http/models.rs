use serde::{Deserialize, Serialize};

use crate::application::ledger::BonusOutcome;
use crate::application::pagination::{PageParams, Paginated};
use crate::domain::credits::{CreditAccount, CreditHistoryEntry, UserProfile};
use crate::domain::posts::{FeedSource, NormalizedPost};
use crate::domain::reports::ReportRecord;
use crate::domain::saved::SavedPostRecord;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub source: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FeedQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageResponse {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub posts: Vec<NormalizedPost>,
}

impl From<Paginated<NormalizedPost>> for FeedPageResponse {
    fn from(page: Paginated<NormalizedPost>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
            posts: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedRefreshResponse {
    pub message: &'static str,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub credits: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPageResponse {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub history: Vec<CreditHistoryEntry>,
}

impl From<Paginated<CreditHistoryEntry>> for HistoryPageResponse {
    fn from(page: Paginated<CreditHistoryEntry>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
            history: page.items,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<ProfileUpdateRequest> for UserProfile {
    fn from(request: ProfileUpdateRequest) -> Self {
        // Blank strings count as absent for completeness.
        let clean = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            name: clean(request.name),
            bio: clean(request.bio),
            avatar: clean(request.avatar),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_bonus: Option<BonusOutcome>,
}

/// Account and profile fields of the caller, flattened into one object.
#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub account: CreditAccount,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostResponse {
    pub message: &'static str,
    pub saved: SavedPostRecord,
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPageResponse {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub posts: Vec<SavedPostRecord>,
}

impl From<Paginated<SavedPostRecord>> for SavedPageResponse {
    fn from(page: Paginated<SavedPostRecord>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
            posts: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePostRequest {
    pub post_id: String,
    #[serde(default)]
    pub source: Option<FeedSource>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub message: &'static str,
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreatedResponse {
    pub message: &'static str,
    pub report: ReportRecord,
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<ReportRecord>,
}
