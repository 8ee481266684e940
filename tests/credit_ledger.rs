use std::sync::{Arc, Mutex};

use time::{Date, Month, OffsetDateTime, Time};

use creator_dashboard::application::clock::Clock;
use creator_dashboard::application::ledger::{CreditLedger, LedgerError};
use creator_dashboard::application::repos::AccountsRepo;
use creator_dashboard::domain::credits::{
    CreditAccount, CreditRules, CreditType, DAILY_LOGIN_REASON, PROFILE_COMPLETE_REASON,
};
use creator_dashboard::infra::memory::MemoryRepositories;

/// Clock pinned to a settable UTC date.
struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    fn on(year: i32, month: Month, day: u8) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(at(year, month, day)),
        })
    }

    fn set(&self, year: i32, month: Month, day: u8) {
        *self.now.lock().expect("clock lock") = at(year, month, day);
    }
}

fn at(year: i32, month: Month, day: u8) -> OffsetDateTime {
    Date::from_calendar_date(year, month, day)
        .expect("valid date")
        .with_time(Time::from_hms(12, 0, 0).expect("valid time"))
        .assume_utc()
}

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        *self.now.lock().expect("clock lock")
    }
}

fn ledger_with_account(
    account: CreditAccount,
    clock: Arc<FixedClock>,
) -> (Arc<CreditLedger>, MemoryRepositories) {
    let repos = MemoryRepositories::new();
    repos.insert_account(account);
    let ledger = CreditLedger::new(Arc::new(repos.clone()), CreditRules::default(), clock);
    (Arc::new(ledger), repos)
}

async fn balance(repos: &MemoryRepositories, user_id: i64) -> i64 {
    repos
        .find_account(user_id)
        .await
        .expect("find account")
        .expect("account exists")
        .credits
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_interactions_lose_no_updates() {
    let (ledger, repos) = ledger_with_account(
        CreditAccount::new(1),
        FixedClock::on(2024, Month::June, 1),
    );

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let action = if i % 2 == 0 { "save_post" } else { "share_post" };
                ledger.award_interaction(1, action).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task").expect("award");
    }

    assert_eq!(balance(&repos, 1).await, 100);
    let history = repos.history_snapshot(1);
    assert_eq!(history.len(), 50);
    assert!(history.iter().all(|entry| entry.amount == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_earn_and_deduct_never_go_negative() {
    let mut account = CreditAccount::new(2);
    account.credits = 5;
    let (ledger, repos) = ledger_with_account(account, FixedClock::on(2024, Month::June, 1));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let amount = if i % 2 == 0 { -7 } else { 3 };
                ledger
                    .adjust_credits(2, amount, CreditType::for_amount(amount), "test")
                    .await
            })
        })
        .collect();

    for handle in handles {
        let adjustment = handle.await.expect("task").expect("adjust");
        assert!(adjustment.new_balance >= 0);
    }

    assert!(balance(&repos, 2).await >= 0);
    assert_eq!(repos.history_snapshot(2).len(), 20);
}

#[tokio::test]
async fn daily_login_awards_once_per_day() {
    let clock = FixedClock::on(2024, Month::June, 1);
    let (ledger, repos) = ledger_with_account(CreditAccount::new(3), clock.clone());

    let account = repos.find_account(3).await.expect("find").expect("exists");
    let first = ledger.award_daily_login(&account).await.expect("first login");
    assert!(first.awarded);
    assert_eq!(first.new_balance, Some(10));

    // The caller still holds the pre-award snapshot; the locked row wins.
    let second = ledger.award_daily_login(&account).await.expect("second login");
    assert!(!second.awarded);
    assert_eq!(second.new_balance, None);
    assert_eq!(balance(&repos, 3).await, 10);

    clock.set(2024, Month::June, 2);
    let account = repos.find_account(3).await.expect("find").expect("exists");
    let next_day = ledger.award_daily_login(&account).await.expect("next day");
    assert!(next_day.awarded);
    assert_eq!(next_day.new_balance, Some(20));

    let history = repos.history_snapshot(3);
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|entry| entry.reason == DAILY_LOGIN_REASON));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_daily_logins_award_exactly_once() {
    let (ledger, repos) = ledger_with_account(
        CreditAccount::new(4),
        FixedClock::on(2024, Month::June, 1),
    );
    let account = CreditAccount::new(4);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let ledger = ledger.clone();
            let account = account.clone();
            tokio::spawn(async move { ledger.award_daily_login(&account).await })
        })
        .collect();

    let mut awarded = 0;
    for handle in handles {
        if handle.await.expect("task").expect("login").awarded {
            awarded += 1;
        }
    }

    assert_eq!(awarded, 1);
    assert_eq!(balance(&repos, 4).await, 10);
    assert_eq!(repos.history_snapshot(4).len(), 1);
}

#[tokio::test]
async fn profile_bonus_is_one_time() {
    let (ledger, repos) = ledger_with_account(
        CreditAccount::new(5),
        FixedClock::on(2024, Month::June, 1),
    );

    let account = repos.find_account(5).await.expect("find").expect("exists");
    let first = ledger
        .award_profile_complete(&account)
        .await
        .expect("profile bonus");
    assert!(first.awarded);
    assert_eq!(first.new_balance, Some(20));

    let second = ledger
        .award_profile_complete(&account)
        .await
        .expect("repeat request");
    assert!(!second.awarded);

    let stored = repos.find_account(5).await.expect("find").expect("exists");
    assert!(stored.is_profile_complete);
    assert_eq!(stored.credits, 20);

    let history = repos.history_snapshot(5);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, PROFILE_COMPLETE_REASON);
    assert_eq!(history[0].kind, CreditType::Earn);
}

#[tokio::test]
async fn deduction_floors_at_zero_and_records_requested_amount() {
    let mut account = CreditAccount::new(6);
    account.credits = 3;
    let (ledger, repos) = ledger_with_account(account, FixedClock::on(2024, Month::June, 1));

    let adjustment = ledger
        .adjust_credits(6, -10, CreditType::Deduct, "Admin adjustment: refund")
        .await
        .expect("deduct");

    assert_eq!(adjustment.new_balance, 0);
    assert_eq!(adjustment.history_entry.amount, -10);
    assert_eq!(adjustment.history_entry.kind, CreditType::Deduct);
    assert_eq!(balance(&repos, 6).await, 0);
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let (ledger, repos) = ledger_with_account(
        CreditAccount::new(7),
        FixedClock::on(2024, Month::June, 1),
    );

    let err = ledger
        .award_interaction(99, "save_post")
        .await
        .expect_err("missing account");
    assert!(matches!(err, LedgerError::NotFound { user_id: 99 }));
    assert!(repos.history_snapshot(99).is_empty());
}
