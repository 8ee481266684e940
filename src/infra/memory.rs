//! In-process repositories, used when no database is configured.
//!
//! Each account sits behind its own `tokio::sync::Mutex`. A ledger transaction
//! holds the owned guard from `lock_account` until commit or drop, so
//! mutations on one account serialize while other accounts proceed freely.
//! Staged writes reach shared state only in `commit`.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    application::repos::{
        AccountsRepo, LedgerRepo, LedgerTx, ReportsRepo, RepoError, SavedPostsRepo,
    },
    domain::{
        credits::{CreditAccount, CreditHistoryEntry, NewCreditEntry, UserId, UserProfile},
        reports::{NewReport, ReportRecord, ReportStatus},
        saved::{SavePostParams, SavedPostRecord},
    },
};

const SAVED_POSTS_UNIQUE: &str = "saved_posts_user_id_post_id_key";

#[derive(Debug, Clone)]
struct AccountRow {
    account: CreditAccount,
    profile: UserProfile,
}

#[derive(Default)]
struct MemoryState {
    accounts: DashMap<UserId, Arc<Mutex<AccountRow>>>,
    /// Per-user history in commit order.
    history: DashMap<UserId, Vec<CreditHistoryEntry>>,
    saved: DashMap<UserId, Vec<SavedPostRecord>>,
    reports: DashMap<UserId, Vec<ReportRecord>>,
    next_history_id: AtomicI64,
    next_saved_id: AtomicI64,
    next_report_id: AtomicI64,
}

impl MemoryState {
    fn account_cell(&self, user_id: UserId) -> Option<Arc<Mutex<AccountRow>>> {
        self.accounts.get(&user_id).map(|entry| entry.value().clone())
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<MemoryState>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account. Replaces any existing account with the same id.
    pub fn insert_account(&self, account: CreditAccount) {
        let row = AccountRow {
            account: account.clone(),
            profile: UserProfile::default(),
        };
        self.state
            .accounts
            .insert(account.id, Arc::new(Mutex::new(row)));
    }

    /// Committed history for `user_id`, oldest first.
    pub fn history_snapshot(&self, user_id: UserId) -> Vec<CreditHistoryEntry> {
        self.state
            .history
            .get(&user_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountsRepo for MemoryRepositories {
    async fn find_account(&self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError> {
        let Some(cell) = self.state.account_cell(user_id) else {
            return Ok(None);
        };
        let row = cell.lock().await;
        Ok(Some(row.account.clone()))
    }

    async fn find_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepoError> {
        let Some(cell) = self.state.account_cell(user_id) else {
            return Ok(None);
        };
        let row = cell.lock().await;
        Ok(Some(row.profile.clone()))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        profile: &UserProfile,
    ) -> Result<UserProfile, RepoError> {
        let cell = self
            .state
            .account_cell(user_id)
            .ok_or(RepoError::NotFound)?;
        let mut row = cell.lock().await;
        row.profile = profile.clone();
        Ok(row.profile.clone())
    }

    async fn list_history(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<CreditHistoryEntry>, RepoError> {
        let Some(entries) = self.state.history.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_history(&self, user_id: UserId) -> Result<u64, RepoError> {
        Ok(self
            .state
            .history
            .get(&user_id)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl LedgerRepo for MemoryRepositories {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, RepoError> {
        Ok(Box::new(MemoryLedgerTx {
            state: self.state.clone(),
            guard: None,
            staged_account: None,
            staged_entries: Vec::new(),
        }))
    }
}

struct MemoryLedgerTx {
    state: Arc<MemoryState>,
    guard: Option<OwnedMutexGuard<AccountRow>>,
    staged_account: Option<CreditAccount>,
    staged_entries: Vec<CreditHistoryEntry>,
}

impl MemoryLedgerTx {
    fn locked_id(&self) -> Result<UserId, RepoError> {
        self.guard
            .as_ref()
            .map(|row| row.account.id)
            .ok_or_else(|| RepoError::InvalidInput {
                message: "no account locked in this transaction".to_string(),
            })
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_account(&mut self, user_id: UserId) -> Result<Option<CreditAccount>, RepoError> {
        if let Some(row) = self.guard.as_ref() {
            if row.account.id == user_id {
                return Ok(Some(row.account.clone()));
            }
            return Err(RepoError::InvalidInput {
                message: format!(
                    "transaction already holds account {}, cannot lock {user_id}",
                    row.account.id
                ),
            });
        }

        let Some(cell) = self.state.account_cell(user_id) else {
            return Ok(None);
        };
        let guard = cell.lock_owned().await;
        let account = guard.account.clone();
        self.guard = Some(guard);
        Ok(Some(account))
    }

    async fn save_account(&mut self, account: &CreditAccount) -> Result<(), RepoError> {
        let locked = self.locked_id()?;
        if account.id != locked {
            return Err(RepoError::InvalidInput {
                message: format!("account {} is not locked by this transaction", account.id),
            });
        }
        if account.credits < 0 {
            return Err(RepoError::Integrity {
                message: "credits must not be negative".to_string(),
            });
        }
        self.staged_account = Some(account.clone());
        Ok(())
    }

    async fn append_entry(
        &mut self,
        entry: NewCreditEntry,
    ) -> Result<CreditHistoryEntry, RepoError> {
        let locked = self.locked_id()?;
        if entry.user_id != locked {
            return Err(RepoError::InvalidInput {
                message: format!("account {} is not locked by this transaction", entry.user_id),
            });
        }
        let id = self.state.next_history_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = entry.into_entry(id);
        self.staged_entries.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemoryLedgerTx {
            state,
            guard,
            staged_account,
            staged_entries,
        } = *self;

        let Some(mut row) = guard else {
            return Ok(());
        };
        if let Some(account) = staged_account {
            row.account = account;
        }
        if !staged_entries.is_empty() {
            state
                .history
                .entry(row.account.id)
                .or_default()
                .extend(staged_entries);
        }
        // Release the account only after history is visible.
        drop(row);
        Ok(())
    }
}

#[async_trait]
impl SavedPostsRepo for MemoryRepositories {
    async fn save_post(
        &self,
        user_id: UserId,
        params: SavePostParams,
    ) -> Result<SavedPostRecord, RepoError> {
        if self.state.account_cell(user_id).is_none() {
            return Err(RepoError::InvalidInput {
                message: format!("user {user_id} does not exist"),
            });
        }

        let mut saved = self.state.saved.entry(user_id).or_default();
        if saved.iter().any(|record| record.post_id == params.post_id) {
            return Err(RepoError::Duplicate {
                constraint: SAVED_POSTS_UNIQUE.to_string(),
            });
        }

        let record = SavedPostRecord {
            id: self.state.next_saved_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            post_id: params.post_id,
            title: params.title,
            content: params.content,
            source: params.source,
            url: params.url,
            author: params.author,
            thumbnail: params.thumbnail,
            upvotes: params.upvotes,
            created_at: OffsetDateTime::now_utc(),
        };
        saved.push(record.clone());
        Ok(record)
    }

    async fn list_saved(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<SavedPostRecord>, RepoError> {
        let Some(saved) = self.state.saved.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(saved
            .iter()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_saved(&self, user_id: UserId) -> Result<u64, RepoError> {
        Ok(self
            .state
            .saved
            .get(&user_id)
            .map(|saved| saved.len() as u64)
            .unwrap_or(0))
    }

    async fn unsave_post(&self, user_id: UserId, post_id: &str) -> Result<(), RepoError> {
        let mut saved = self
            .state
            .saved
            .get_mut(&user_id)
            .ok_or(RepoError::NotFound)?;
        let before = saved.len();
        saved.retain(|record| record.post_id != post_id);
        if saved.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ReportsRepo for MemoryRepositories {
    async fn create_report(
        &self,
        user_id: UserId,
        report: NewReport,
    ) -> Result<ReportRecord, RepoError> {
        if self.state.account_cell(user_id).is_none() {
            return Err(RepoError::InvalidInput {
                message: format!("user {user_id} does not exist"),
            });
        }

        let record = ReportRecord {
            id: self.state.next_report_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            post_id: report.post_id,
            title: report.title,
            source: report.source,
            url: report.url,
            reason: report.reason,
            status: ReportStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        self.state
            .reports
            .entry(user_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list_reports(&self, user_id: UserId) -> Result<Vec<ReportRecord>, RepoError> {
        Ok(self
            .state
            .reports
            .get(&user_id)
            .map(|reports| reports.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
