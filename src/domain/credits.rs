//! Credit accounts, ledger entries, and the rules that gate bonuses.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

pub type UserId = i64;

pub const DAILY_LOGIN_REASON: &str = "Daily login bonus";
pub const PROFILE_COMPLETE_REASON: &str = "Profile completion bonus";

/// Reason recorded for a per-interaction grant.
pub fn interaction_reason(action: &str) -> String {
    format!("Interaction: {action}")
}

/// Reason recorded for an operator adjustment.
pub fn admin_reason(reason: &str) -> String {
    format!("[Admin] {reason}")
}

/// The balance-bearing subset of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub id: UserId,
    pub credits: i64,
    pub last_login_date: Option<Date>,
    pub is_profile_complete: bool,
}

impl CreditAccount {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            credits: 0,
            last_login_date: None,
            is_profile_complete: false,
        }
    }

    /// Apply a signed delta, flooring the balance at zero. Returns the new balance.
    pub fn apply_delta(&mut self, amount: i64) -> i64 {
        self.credits = floored_balance(self.credits, amount);
        self.credits
    }

    /// Record a login on `today`. Returns `false` when today's login was already recorded.
    pub fn mark_login(&mut self, today: Date) -> bool {
        if self.last_login_date == Some(today) {
            return false;
        }
        self.last_login_date = Some(today);
        true
    }

    /// Flip the profile-complete flag. Returns `false` when it was already set.
    pub fn mark_profile_complete(&mut self) -> bool {
        if self.is_profile_complete {
            return false;
        }
        self.is_profile_complete = true;
        true
    }
}

pub fn floored_balance(current: i64, amount: i64) -> i64 {
    current.saturating_add(amount).max(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditType {
    Earn,
    Deduct,
}

impl CreditType {
    pub fn for_amount(amount: i64) -> Self {
        if amount >= 0 {
            CreditType::Earn
        } else {
            CreditType::Deduct
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CreditType::Earn => "earn",
            CreditType::Deduct => "deduct",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "earn" => Some(CreditType::Earn),
            "deduct" => Some(CreditType::Deduct),
            _ => None,
        }
    }
}

/// Immutable audit record of one balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditHistoryEntry {
    pub id: i64,
    pub user_id: UserId,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: CreditType,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A history entry about to be appended; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCreditEntry {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: CreditType,
    pub reason: String,
    pub created_at: OffsetDateTime,
}

impl NewCreditEntry {
    pub fn new(user_id: UserId, amount: i64, reason: impl Into<String>, at: OffsetDateTime) -> Self {
        Self {
            user_id,
            amount,
            kind: CreditType::for_amount(amount),
            reason: reason.into(),
            created_at: at,
        }
    }

    pub fn into_entry(self, id: i64) -> CreditHistoryEntry {
        CreditHistoryEntry {
            id,
            user_id: self.user_id,
            amount: self.amount,
            kind: self.kind,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

/// Fixed bonus amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditRules {
    pub daily_login: i64,
    pub profile_complete: i64,
    pub interaction: i64,
}

impl Default for CreditRules {
    fn default() -> Self {
        Self {
            daily_login: 10,
            profile_complete: 20,
            interaction: 2,
        }
    }
}

/// Public profile fields that drive the profile-completion bonus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl UserProfile {
    /// All three fields present and non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.bio, &self.avatar]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn balance_never_goes_negative() {
        let mut account = CreditAccount {
            credits: 30,
            ..CreditAccount::new(1)
        };
        assert_eq!(account.apply_delta(-100), 0);
        assert_eq!(account.apply_delta(5), 5);
        assert_eq!(floored_balance(i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn type_is_derived_from_sign() {
        assert_eq!(CreditType::for_amount(0), CreditType::Earn);
        assert_eq!(CreditType::for_amount(2), CreditType::Earn);
        assert_eq!(CreditType::for_amount(-1), CreditType::Deduct);
    }

    #[test]
    fn login_marks_once_per_day() {
        let mut account = CreditAccount::new(1);
        assert!(account.mark_login(date!(2024 - 03 - 01)));
        assert!(!account.mark_login(date!(2024 - 03 - 01)));
        assert!(account.mark_login(date!(2024 - 03 - 02)));
    }

    #[test]
    fn profile_flag_is_monotonic() {
        let mut account = CreditAccount::new(1);
        assert!(account.mark_profile_complete());
        assert!(!account.mark_profile_complete());
        assert!(account.is_profile_complete);
    }

    #[test]
    fn profile_completeness_ignores_blank_fields() {
        let profile = UserProfile {
            name: Some("Ada".into()),
            bio: Some("   ".into()),
            avatar: Some("https://example.com/a.png".into()),
        };
        assert!(!profile.is_complete());

        let profile = UserProfile {
            bio: Some("Builds things".into()),
            ..profile
        };
        assert!(profile.is_complete());
    }

    #[test]
    fn history_entry_serializes_type_field() {
        let entry = NewCreditEntry::new(
            7,
            -3,
            "penalty",
            time::macros::datetime!(2024-01-01 0:00 UTC),
        )
        .into_entry(1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "deduct");
        assert_eq!(json["userId"], 7);
    }
}
