use std::{process, sync::Arc};

use creator_dashboard::{
    application::{
        clock::{Clock, SystemClock},
        error::AppError,
        feed::{FeedConfig, FeedService},
        ledger::CreditLedger,
        repos::{AccountsRepo, LedgerRepo, ReportsRepo, SavedPostsRepo},
    },
    cache::{CacheConfig, CacheProvider},
    config,
    domain::credits::{CreditAccount, CreditType, UserId, admin_reason},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        memory::MemoryRepositories,
        sources, telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

/// Account seeded when running without a database.
const DEMO_USER_ID: UserId = 1;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command_or_default() {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Feed(args) => run_feed(settings, args).await,
        config::Command::Adjust(args) => run_adjust(settings, args).await,
    }
}

/// Persistence handles shared by every command.
struct Repositories {
    accounts: Arc<dyn AccountsRepo>,
    ledger: Arc<dyn LedgerRepo>,
    saved_posts: Arc<dyn SavedPostsRepo>,
    reports: Arc<dyn ReportsRepo>,
    db: Option<Arc<PostgresRepositories>>,
}

impl Repositories {
    fn postgres(repositories: Arc<PostgresRepositories>) -> Self {
        Self {
            accounts: repositories.clone(),
            ledger: repositories.clone(),
            saved_posts: repositories.clone(),
            reports: repositories.clone(),
            db: Some(repositories),
        }
    }

    fn memory(repositories: MemoryRepositories) -> Self {
        let repositories = Arc::new(repositories);
        Self {
            accounts: repositories.clone(),
            ledger: repositories.clone(),
            saved_posts: repositories.clone(),
            reports: repositories,
            db: None,
        }
    }
}

async fn connect_postgres(
    settings: &config::DatabaseSettings,
    database_url: &str,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = PostgresRepositories::connect(database_url, settings.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    match settings.database.url.as_deref() {
        Some(url) => Ok(Repositories::postgres(
            connect_postgres(&settings.database, url).await?,
        )),
        None => {
            warn!(
                target = "creator_dashboard::startup",
                demo_user_id = DEMO_USER_ID,
                "No database configured; using in-process repositories"
            );
            let repositories = MemoryRepositories::new();
            repositories.insert_account(CreditAccount::new(DEMO_USER_ID));
            Ok(Repositories::memory(repositories))
        }
    }
}

async fn build_feed_service(
    settings: &config::Settings,
    clock: Arc<dyn Clock>,
) -> Result<FeedService, AppError> {
    let cache = CacheProvider::connect(&CacheConfig::from(&settings.cache)).await;
    let providers = sources::build_providers(&settings.feed, clock)?;
    Ok(FeedService::new(
        Arc::new(cache),
        providers,
        FeedConfig::from(&settings.feed),
    ))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repositories = init_repositories(&settings).await?;
    let feed = build_feed_service(&settings, clock.clone()).await?;
    let ledger = CreditLedger::new(repositories.ledger.clone(), settings.credits, clock);

    let state = AppState {
        feed: Arc::new(feed),
        ledger: Arc::new(ledger),
        accounts: repositories.accounts,
        saved_posts: repositories.saved_posts,
        reports: repositories.reports,
        db: repositories.db,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "creator_dashboard::startup",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_feed(settings: config::Settings, args: config::FeedArgs) -> Result<(), AppError> {
    let feed = build_feed_service(&settings, Arc::new(SystemClock)).await?;

    if args.refresh {
        feed.invalidate_feed_cache().await?;
    }

    let posts = feed.get_unified_feed().await;
    let rendered = serde_json::to_string_pretty(&posts)
        .map_err(|err| AppError::unexpected(format!("failed to encode feed: {err}")))?;
    println!("{rendered}");
    Ok(())
}

async fn run_adjust(settings: config::Settings, args: config::AdjustArgs) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("adjust requires a database url"))?;
    let repositories = connect_postgres(&settings.database, database_url).await?;

    let ledger = CreditLedger::new(repositories, settings.credits, Arc::new(SystemClock));
    let adjustment = ledger
        .adjust_credits(
            args.user_id,
            args.amount,
            CreditType::for_amount(args.amount),
            &admin_reason(&args.reason),
        )
        .await?;

    info!(
        target = "creator_dashboard::adjust",
        user_id = args.user_id,
        amount = args.amount,
        new_balance = adjustment.new_balance,
        entry_id = adjustment.history_entry.id,
        "Credits adjusted"
    );
    Ok(())
}
