//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::credits::{
    CreditAccount, CreditHistoryEntry, NewCreditEntry, UserId, UserProfile,
};
use crate::domain::reports::{NewReport, ReportRecord};
use crate::domain::saved::{SavePostParams, SavedPostRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read-side and profile access to user accounts.
#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn find_account(&self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError>;

    async fn find_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepoError>;

    /// Overwrite profile fields. Never touches the balance or bonus flags.
    async fn update_profile(
        &self,
        user_id: UserId,
        profile: &UserProfile,
    ) -> Result<UserProfile, RepoError>;

    /// History for one user, newest first.
    async fn list_history(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<CreditHistoryEntry>, RepoError>;

    async fn count_history(&self, user_id: UserId) -> Result<u64, RepoError>;
}

/// Opens serializable units of work over a single account.
#[async_trait]
pub trait LedgerRepo: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, RepoError>;
}

/// One open ledger transaction.
///
/// `lock_account` excludes every other transaction on the same account until
/// this one commits or is dropped. Writes are invisible until `commit`; dropping
/// the transaction discards them.
#[async_trait]
pub trait LedgerTx: Send {
    async fn lock_account(&mut self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError>;

    async fn save_account(&mut self, account: &CreditAccount) -> Result<(), RepoError>;

    async fn append_entry(&mut self, entry: NewCreditEntry)
    -> Result<CreditHistoryEntry, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SavedPostsRepo: Send + Sync {
    /// Insert a saved post. Fails with `RepoError::Duplicate` when the user
    /// already saved this post.
    async fn save_post(
        &self,
        user_id: UserId,
        params: SavePostParams,
    ) -> Result<SavedPostRecord, RepoError>;

    async fn list_saved(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<SavedPostRecord>, RepoError>;

    async fn count_saved(&self, user_id: UserId) -> Result<u64, RepoError>;

    /// Remove a saved post. Fails with `RepoError::NotFound` when the user never
    /// saved it.
    async fn unsave_post(&self, user_id: UserId, post_id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ReportsRepo: Send + Sync {
    /// Store a new report in the `pending` state.
    async fn create_report(
        &self,
        user_id: UserId,
        report: NewReport,
    ) -> Result<ReportRecord, RepoError>;

    /// Every report filed by one user, newest first.
    async fn list_reports(&self, user_id: UserId) -> Result<Vec<ReportRecord>, RepoError>;
}
