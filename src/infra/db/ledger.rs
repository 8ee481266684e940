use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::{
    application::repos::{LedgerRepo, LedgerTx, RepoError},
    domain::credits::{CreditAccount, CreditHistoryEntry, NewCreditEntry, UserId},
};

use super::{
    PostgresRepositories,
    accounts::{self, HistoryRow},
    map_sqlx_error,
};

/// One database transaction. Dropping it without `commit` rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerRepo for PostgresRepositories {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, RepoError> {
        let tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_account(&mut self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError> {
        accounts::lock_account(&mut self.tx, user_id).await
    }

    async fn save_account(&mut self, account: &CreditAccount) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE users SET credits = $2, last_login_date = $3, is_profile_complete = $4, \
             updated_at = now() WHERE id = $1",
        )
        .bind(account.id)
        .bind(account.credits)
        .bind(account.last_login_date)
        .bind(account.is_profile_complete)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn append_entry(
        &mut self,
        entry: NewCreditEntry,
    ) -> Result<CreditHistoryEntry, RepoError> {
        let row = sqlx::query_as::<_, HistoryRow>(
            "INSERT INTO credit_histories (user_id, amount, type, reason, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, amount, type, reason, created_at",
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.kind.as_str())
        .bind(&entry.reason)
        .bind(entry.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        CreditHistoryEntry::try_from(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
