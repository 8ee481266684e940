//! Ledger and repository behaviour against Postgres.
//!
//! - Marked `#[ignore]`; run with `DATABASE_URL` set so `sqlx::test` can
//!   create a scratch database per test.

use std::sync::Arc;

use sqlx::PgPool;

use creator_dashboard::application::clock::SystemClock;
use creator_dashboard::application::ledger::CreditLedger;
use creator_dashboard::application::repos::{AccountsRepo, ReportsRepo, RepoError, SavedPostsRepo};
use creator_dashboard::domain::credits::{CreditRules, CreditType, UserProfile};
use creator_dashboard::domain::posts::FeedSource;
use creator_dashboard::domain::reports::{NewReport, ReportStatus};
use creator_dashboard::domain::saved::SavePostParams;
use creator_dashboard::infra::db::PostgresRepositories;

async fn insert_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("insert user")
}

fn ledger(repos: &Arc<PostgresRepositories>) -> Arc<CreditLedger> {
    Arc::new(CreditLedger::new(
        repos.clone(),
        CreditRules::default(),
        Arc::new(SystemClock),
    ))
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_awards_serialize_on_the_row_lock(pool: PgPool) {
    let user_id = insert_user(&pool, "concurrent").await;
    let repos = Arc::new(PostgresRepositories::new(pool));
    let ledger = ledger(&repos);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.award_interaction(user_id, "save_post").await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task").expect("award");
    }

    let account = repos
        .find_account(user_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(account.credits, 40);
    assert_eq!(repos.count_history(user_id).await.expect("count"), 20);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn daily_login_and_profile_bonus_are_idempotent(pool: PgPool) {
    let user_id = insert_user(&pool, "bonuses").await;
    let repos = Arc::new(PostgresRepositories::new(pool));
    let ledger = ledger(&repos);

    let account = repos
        .find_account(user_id)
        .await
        .expect("find")
        .expect("exists");
    assert!(ledger.award_daily_login(&account).await.expect("login").awarded);
    assert!(!ledger.award_daily_login(&account).await.expect("login").awarded);
    assert!(
        ledger
            .award_profile_complete(&account)
            .await
            .expect("profile")
            .awarded
    );
    assert!(
        !ledger
            .award_profile_complete(&account)
            .await
            .expect("profile")
            .awarded
    );

    let history = repos.list_history(user_id, 0, 10).await.expect("history");
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|entry| entry.kind == CreditType::Earn));

    let stored = repos
        .find_account(user_id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(stored.credits, 30);
    assert!(stored.is_profile_complete);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deduction_floors_at_zero(pool: PgPool) {
    let user_id = insert_user(&pool, "floor").await;
    let repos = Arc::new(PostgresRepositories::new(pool));
    let ledger = ledger(&repos);

    let adjustment = ledger
        .adjust_credits(user_id, -50, CreditType::Deduct, "Admin adjustment: test")
        .await
        .expect("adjust");
    assert_eq!(adjustment.new_balance, 0);
    assert_eq!(adjustment.history_entry.amount, -50);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_saved_post_is_rejected(pool: PgPool) {
    let user_id = insert_user(&pool, "saver").await;
    let repos = PostgresRepositories::new(pool);
    let params = SavePostParams {
        post_id: "reddit_abc".to_string(),
        title: "Title".to_string(),
        content: None,
        source: FeedSource::Reddit,
        url: "https://reddit.com/r/x/abc".to_string(),
        author: None,
        thumbnail: None,
        upvotes: 5,
    };

    repos
        .save_post(user_id, params.clone())
        .await
        .expect("first save");
    let err = repos
        .save_post(user_id, params)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, RepoError::Duplicate { .. }));
    assert_eq!(repos.count_saved(user_id).await.expect("count"), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn profile_update_round_trips(pool: PgPool) {
    let user_id = insert_user(&pool, "profile").await;
    let repos = PostgresRepositories::new(pool);
    let profile = UserProfile {
        name: Some("Ada".to_string()),
        bio: Some("Writes code".to_string()),
        avatar: None,
    };

    let stored = repos
        .update_profile(user_id, &profile)
        .await
        .expect("update");
    assert_eq!(stored, profile);
    assert_eq!(
        repos.find_profile(user_id).await.expect("find"),
        Some(profile)
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unsave_deletes_one_row(pool: PgPool) {
    let user_id = insert_user(&pool, "unsaver").await;
    let repos = PostgresRepositories::new(pool);
    repos
        .save_post(
            user_id,
            SavePostParams {
                post_id: "li_1".into(),
                title: "t".into(),
                content: None,
                source: FeedSource::Linkedin,
                url: "https://linkedin.com/x".into(),
                author: None,
                thumbnail: None,
                upvotes: 0,
            },
        )
        .await
        .expect("save");

    repos.unsave_post(user_id, "li_1").await.expect("unsave");
    assert_eq!(repos.count_saved(user_id).await.expect("count"), 0);
    assert!(matches!(
        repos.unsave_post(user_id, "li_1").await,
        Err(RepoError::NotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reports_default_to_pending(pool: PgPool) {
    let user_id = insert_user(&pool, "reporter").await;
    let repos = PostgresRepositories::new(pool);

    let created = repos
        .create_report(
            user_id,
            NewReport {
                post_id: "reddit_x".into(),
                title: Some("x".into()),
                source: FeedSource::Reddit,
                url: None,
                reason: "harassment".into(),
            },
        )
        .await
        .expect("report");
    assert_eq!(created.status, ReportStatus::Pending);

    let listed = repos.list_reports(user_id).await.expect("list");
    assert_eq!(listed, vec![created]);
}
