//! Credit ledger: the only writer of account balances.
//!
//! Every mutation, including the check half of the once-per-day and once-ever
//! bonuses, runs inside one `LedgerTx`. The account row is locked before the
//! guard is evaluated, so concurrent duplicate requests cannot both pass it.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::clock::Clock;
use crate::application::repos::{LedgerRepo, RepoError};
use crate::domain::credits::{
    CreditAccount, CreditHistoryEntry, CreditRules, CreditType, DAILY_LOGIN_REASON,
    NewCreditEntry, PROFILE_COMPLETE_REASON, UserId, interaction_reason,
};

const METRIC_MUTATION: &str = "dashboard_ledger_mutation_total";
const METRIC_BONUS_SKIPPED: &str = "dashboard_ledger_bonus_skipped_total";

const SOURCE: &str = "creator_dashboard::ledger";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account {user_id} not found")]
    NotFound { user_id: UserId },
    /// The balance update and history append did not commit together.
    #[error("ledger transaction failed: {0}")]
    Transaction(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    pub new_balance: i64,
    pub history_entry: CreditHistoryEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusOutcome {
    pub awarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i64>,
}

impl BonusOutcome {
    fn skipped() -> Self {
        Self {
            awarded: false,
            new_balance: None,
        }
    }

    fn awarded(new_balance: i64) -> Self {
        Self {
            awarded: true,
            new_balance: Some(new_balance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionAward {
    pub new_balance: i64,
}

#[derive(Debug, Clone, Copy)]
enum Bonus {
    DailyLogin,
    ProfileComplete,
}

impl Bonus {
    fn as_str(self) -> &'static str {
        match self {
            Bonus::DailyLogin => "daily_login",
            Bonus::ProfileComplete => "profile_complete",
        }
    }
}

pub struct CreditLedger {
    repo: Arc<dyn LedgerRepo>,
    rules: CreditRules,
    clock: Arc<dyn Clock>,
}

impl CreditLedger {
    pub fn new(repo: Arc<dyn LedgerRepo>, rules: CreditRules, clock: Arc<dyn Clock>) -> Self {
        Self { repo, rules, clock }
    }

    pub fn rules(&self) -> CreditRules {
        self.rules
    }

    /// Apply `amount` to the balance, floored at zero, and append one history entry.
    ///
    /// The stored entry type always follows the sign of `amount`; `kind` is only
    /// checked against it.
    pub async fn adjust_credits(
        &self,
        user_id: UserId,
        amount: i64,
        kind: CreditType,
        reason: &str,
    ) -> Result<Adjustment, LedgerError> {
        let derived = CreditType::for_amount(amount);
        if kind != derived {
            warn!(
                target = SOURCE,
                user_id,
                amount,
                requested = kind.as_str(),
                recorded = derived.as_str(),
                "Credit type does not match amount sign; recording derived type"
            );
        }

        let adjustment = self.mutate(user_id, amount, reason, |_| true).await?;
        // An unconditional guard always applies.
        adjustment.ok_or(LedgerError::NotFound { user_id })
    }

    /// Grant the daily-login bonus unless `account` already logged in today.
    pub async fn award_daily_login(
        &self,
        account: &CreditAccount,
    ) -> Result<BonusOutcome, LedgerError> {
        let today = self.clock.today();
        if account.last_login_date == Some(today) {
            return Ok(skip(account.id, Bonus::DailyLogin));
        }

        let adjustment = self
            .mutate(account.id, self.rules.daily_login, DAILY_LOGIN_REASON, |locked| {
                locked.mark_login(today)
            })
            .await?;
        Ok(match adjustment {
            Some(adjustment) => BonusOutcome::awarded(adjustment.new_balance),
            None => skip(account.id, Bonus::DailyLogin),
        })
    }

    /// Grant the one-time profile-completion bonus and set the flag for good.
    pub async fn award_profile_complete(
        &self,
        account: &CreditAccount,
    ) -> Result<BonusOutcome, LedgerError> {
        if account.is_profile_complete {
            return Ok(skip(account.id, Bonus::ProfileComplete));
        }

        let adjustment = self
            .mutate(
                account.id,
                self.rules.profile_complete,
                PROFILE_COMPLETE_REASON,
                CreditAccount::mark_profile_complete,
            )
            .await?;
        Ok(match adjustment {
            Some(adjustment) => BonusOutcome::awarded(adjustment.new_balance),
            None => skip(account.id, Bonus::ProfileComplete),
        })
    }

    /// Grant the per-interaction bonus. Callers deduplicate interactions.
    pub async fn award_interaction(
        &self,
        user_id: UserId,
        action: &str,
    ) -> Result<InteractionAward, LedgerError> {
        let adjustment = self
            .adjust_credits(
                user_id,
                self.rules.interaction,
                CreditType::for_amount(self.rules.interaction),
                &interaction_reason(action),
            )
            .await?;
        Ok(InteractionAward {
            new_balance: adjustment.new_balance,
        })
    }

    /// Lock the account, run `guard` against the locked row, then apply the
    /// delta and append the entry. `Ok(None)` means the guard declined and
    /// nothing was written.
    async fn mutate<F>(
        &self,
        user_id: UserId,
        amount: i64,
        reason: &str,
        guard: F,
    ) -> Result<Option<Adjustment>, LedgerError>
    where
        F: FnOnce(&mut CreditAccount) -> bool + Send,
    {
        let mut tx = self.repo.begin().await?;
        let mut account = tx
            .lock_account(user_id)
            .await?
            .ok_or(LedgerError::NotFound { user_id })?;

        if !guard(&mut account) {
            return Ok(None);
        }

        let previous = account.credits;
        let new_balance = account.apply_delta(amount);
        tx.save_account(&account).await?;
        let entry = tx
            .append_entry(NewCreditEntry::new(
                user_id,
                amount,
                reason,
                self.clock.now_utc(),
            ))
            .await?;
        tx.commit().await?;

        counter!(METRIC_MUTATION, "type" => entry.kind.as_str()).increment(1);
        info!(
            target = SOURCE,
            user_id,
            amount,
            previous,
            new_balance,
            reason,
            "Credits adjusted"
        );

        Ok(Some(Adjustment {
            new_balance,
            history_entry: entry,
        }))
    }
}

fn skip(user_id: UserId, bonus: Bonus) -> BonusOutcome {
    counter!(METRIC_BONUS_SKIPPED, "bonus" => bonus.as_str()).increment(1);
    debug!(target = SOURCE, user_id, bonus = bonus.as_str(), "Bonus already granted");
    BonusOutcome::skipped()
}
