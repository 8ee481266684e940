use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ReportsRepo, RepoError},
    domain::{
        credits::UserId,
        error::DomainError,
        posts::FeedSource,
        reports::{NewReport, ReportRecord, ReportStatus},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const REPORT_COLUMNS: &str = "id, user_id, post_id, title, source, url, reason, status, created_at";

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    user_id: i64,
    post_id: String,
    title: Option<String>,
    source: String,
    url: Option<String>,
    reason: String,
    status: String,
    created_at: OffsetDateTime,
}

impl TryFrom<ReportRow> for ReportRecord {
    type Error = RepoError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let integrity = move |err: DomainError| RepoError::Integrity {
            message: format!("report {id}: {err}"),
        };
        let source: FeedSource = row.source.parse().map_err(integrity)?;
        let status = ReportStatus::parse(&row.status).map_err(integrity)?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            title: row.title,
            source,
            url: row.url,
            reason: row.reason,
            status,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ReportsRepo for PostgresRepositories {
    async fn create_report(
        &self,
        user_id: UserId,
        report: NewReport,
    ) -> Result<ReportRecord, RepoError> {
        let sql = format!(
            "INSERT INTO reports (user_id, post_id, title, source, url, reason) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REPORT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(user_id)
            .bind(&report.post_id)
            .bind(report.title.as_deref())
            .bind(report.source.as_str())
            .bind(report.url.as_deref())
            .bind(&report.reason)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ReportRecord::try_from(row)
    }

    async fn list_reports(&self, user_id: UserId) -> Result<Vec<ReportRecord>, RepoError> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(ReportRecord::try_from).collect()
    }
}
