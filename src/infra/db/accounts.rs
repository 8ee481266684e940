use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::{Date, OffsetDateTime};

use crate::{
    application::repos::{AccountsRepo, RepoError},
    domain::{
        credits::{CreditAccount, CreditHistoryEntry, CreditType, UserId, UserProfile},
        error::DomainError,
    },
};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{convert_count, page_bounds},
};

#[derive(sqlx::FromRow)]
pub(super) struct AccountRow {
    id: i64,
    credits: i64,
    last_login_date: Option<Date>,
    is_profile_complete: bool,
}

impl From<AccountRow> for CreditAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            credits: row.credits,
            last_login_date: row.last_login_date,
            is_profile_complete: row.is_profile_complete,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    name: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            name: row.name,
            bio: row.bio,
            avatar: row.avatar,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct HistoryRow {
    id: i64,
    user_id: i64,
    amount: i64,
    #[sqlx(rename = "type")]
    kind: String,
    reason: String,
    created_at: OffsetDateTime,
}

impl TryFrom<HistoryRow> for CreditHistoryEntry {
    type Error = RepoError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let kind = CreditType::parse(&row.kind).ok_or_else(|| {
            let err = DomainError::invariant(format!(
                "credit history {} has unknown type `{}`",
                row.id, row.kind
            ));
            RepoError::Integrity {
                message: err.to_string(),
            }
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            kind,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

pub(super) async fn lock_account(
    tx: &mut Transaction<'static, Postgres>,
    user_id: UserId,
) -> Result<Option<CreditAccount>, RepoError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, credits, last_login_date, is_profile_complete \
         FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(CreditAccount::from))
}

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn find_account(&self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, credits, last_login_date, is_profile_complete FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CreditAccount::from))
    }

    async fn find_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepoError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT name, bio, avatar FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserProfile::from))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        profile: &UserProfile,
    ) -> Result<UserProfile, RepoError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "UPDATE users SET name = $2, bio = $3, avatar = $4, updated_at = now() \
             WHERE id = $1 RETURNING name, bio, avatar",
        )
        .bind(user_id)
        .bind(profile.name.as_deref())
        .bind(profile.bio.as_deref())
        .bind(profile.avatar.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_history(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<CreditHistoryEntry>, RepoError> {
        let (offset, limit) = page_bounds(offset, limit)?;
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, user_id, amount, type, reason, created_at FROM credit_histories \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CreditHistoryEntry::try_from).collect()
    }

    async fn count_history(&self, user_id: UserId) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM credit_histories WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}
