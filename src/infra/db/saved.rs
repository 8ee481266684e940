use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, SavedPostsRepo},
    domain::{
        credits::UserId,
        posts::FeedSource,
        saved::{SavePostParams, SavedPostRecord},
    },
};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{convert_count, non_negative, page_bounds},
};

const SAVED_COLUMNS: &str =
    "id, user_id, post_id, title, content, source, url, author, thumbnail, upvotes, created_at";

#[derive(sqlx::FromRow)]
struct SavedPostRow {
    id: i64,
    user_id: i64,
    post_id: String,
    title: String,
    content: Option<String>,
    source: String,
    url: String,
    author: Option<String>,
    thumbnail: Option<String>,
    upvotes: i64,
    created_at: OffsetDateTime,
}

impl TryFrom<SavedPostRow> for SavedPostRecord {
    type Error = RepoError;

    fn try_from(row: SavedPostRow) -> Result<Self, Self::Error> {
        let source: FeedSource = row.source.parse().map_err(|err| RepoError::Integrity {
            message: format!("saved post {}: {err}", row.id),
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            title: row.title,
            content: row.content,
            source,
            url: row.url,
            author: row.author,
            thumbnail: row.thumbnail,
            upvotes: non_negative(row.upvotes, "saved_posts.upvotes")?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl SavedPostsRepo for PostgresRepositories {
    async fn save_post(
        &self,
        user_id: UserId,
        params: SavePostParams,
    ) -> Result<SavedPostRecord, RepoError> {
        let upvotes = i64::try_from(params.upvotes).map_err(|_| RepoError::InvalidInput {
            message: "upvotes exceeds supported range".to_string(),
        })?;

        let sql = format!(
            "INSERT INTO saved_posts \
             (user_id, post_id, title, content, source, url, author, thumbnail, upvotes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {SAVED_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SavedPostRow>(&sql)
            .bind(user_id)
            .bind(&params.post_id)
            .bind(&params.title)
            .bind(params.content.as_deref())
            .bind(params.source.as_str())
            .bind(&params.url)
            .bind(params.author.as_deref())
            .bind(params.thumbnail.as_deref())
            .bind(upvotes)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        SavedPostRecord::try_from(row)
    }

    async fn list_saved(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<SavedPostRecord>, RepoError> {
        let (offset, limit) = page_bounds(offset, limit)?;
        let sql = format!(
            "SELECT {SAVED_COLUMNS} FROM saved_posts WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3"
        );
        let rows = sqlx::query_as::<_, SavedPostRow>(&sql)
            .bind(user_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(SavedPostRecord::try_from).collect()
    }

    async fn count_saved(&self, user_id: UserId) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_posts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn unsave_post(&self, user_id: UserId, post_id: &str) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
