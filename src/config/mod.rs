//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::{credits::CreditRules, posts::FeedSource};

pub use cli::{
    AdjustArgs, CacheOverride, CliArgs, Command, DatabaseOverride, FeedArgs, ServeArgs,
    ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "dashboard";
const ENV_PREFIX: &str = "DASHBOARD";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_CONNECT_TIMEOUT_MS: u64 = 1_500;
const DEFAULT_FEED_CACHE_KEY: &str = "unified_feed";
const DEFAULT_FEED_TTL_SECS: u64 = 300;
const DEFAULT_FEED_FETCH_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_SUBREDDITS: [&str; 3] = ["programming", "webdev", "javascript"];
const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";
const DEFAULT_REDDIT_LIMIT: u32 = 10;
const DEFAULT_CONTENT_LIMIT: usize = 400;
const DEFAULT_USER_AGENT: &str = "CreatorDashboard/1.0";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub feed: FeedSettings,
    pub credits: CreditRules,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// `None` keeps accounts in process memory.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub cache_key: String,
    pub ttl: Duration,
    pub fetch_timeout: Duration,
    pub sources: Vec<FeedSource>,
    pub subreddits: Vec<String>,
    pub reddit_base_url: String,
    pub reddit_limit: u32,
    pub content_limit: usize,
    pub user_agent: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("feed.sources")
            .with_list_parse_key("feed.subreddits"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Feed(args)) => raw.apply_cache_override(&args.cache),
        Some(Command::Adjust(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    feed: RawFeedSettings,
    credits: RawCreditSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.feed_ttl_seconds {
            self.feed.ttl_seconds = Some(ttl);
        }
        if let Some(timeout) = overrides.feed_fetch_timeout_ms {
            self.feed.fetch_timeout_ms = Some(timeout);
        }

        self.apply_database_override(&overrides.database);
        self.apply_cache_override(&overrides.cache);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_cache_override(&mut self, overrides: &CacheOverride) {
        if let Some(url) = overrides.redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            feed,
            credits,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            feed: build_feed_settings(feed)?,
            credits: build_credit_rules(credits)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let connect_timeout = non_zero_millis(
        cache
            .connect_timeout_ms
            .unwrap_or(DEFAULT_CACHE_CONNECT_TIMEOUT_MS),
        "cache.connect_timeout_ms",
    )?;

    Ok(CacheSettings {
        redis_url: non_blank(cache.redis_url),
        connect_timeout,
    })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedSettings, LoadError> {
    let cache_key = non_blank(feed.cache_key).unwrap_or_else(|| DEFAULT_FEED_CACHE_KEY.to_string());

    let ttl_seconds = feed.ttl_seconds.unwrap_or(DEFAULT_FEED_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "feed.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let fetch_timeout = non_zero_millis(
        feed.fetch_timeout_ms.unwrap_or(DEFAULT_FEED_FETCH_TIMEOUT_MS),
        "feed.fetch_timeout_ms",
    )?;

    let sources = match feed.sources {
        Some(raw) => parse_sources(&raw)?,
        None => FeedSource::ALL.to_vec(),
    };

    let subreddits: Vec<String> = match feed.subreddits {
        Some(raw) => raw
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
    };
    if sources.contains(&FeedSource::Reddit) && subreddits.is_empty() {
        return Err(LoadError::invalid(
            "feed.subreddits",
            "at least one subreddit is required when the reddit source is enabled",
        ));
    }

    let reddit_base_url =
        non_blank(feed.reddit_base_url).unwrap_or_else(|| DEFAULT_REDDIT_BASE_URL.to_string());
    url::Url::parse(&reddit_base_url)
        .map_err(|err| LoadError::invalid("feed.reddit_base_url", err.to_string()))?;

    let reddit_limit = feed.reddit_limit.unwrap_or(DEFAULT_REDDIT_LIMIT);
    if reddit_limit == 0 {
        return Err(LoadError::invalid(
            "feed.reddit_limit",
            "must be greater than zero",
        ));
    }

    let content_limit = feed.content_limit.unwrap_or(DEFAULT_CONTENT_LIMIT);
    if content_limit == 0 {
        return Err(LoadError::invalid(
            "feed.content_limit",
            "must be greater than zero",
        ));
    }

    Ok(FeedSettings {
        cache_key,
        ttl: Duration::from_secs(ttl_seconds),
        fetch_timeout,
        sources,
        subreddits,
        reddit_base_url,
        reddit_limit,
        content_limit,
        user_agent: non_blank(feed.user_agent).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    })
}

fn build_credit_rules(credits: RawCreditSettings) -> Result<CreditRules, LoadError> {
    let defaults = CreditRules::default();
    let rules = CreditRules {
        daily_login: credits.daily_login.unwrap_or(defaults.daily_login),
        profile_complete: credits.profile_complete.unwrap_or(defaults.profile_complete),
        interaction: credits.interaction.unwrap_or(defaults.interaction),
    };

    for (key, value) in [
        ("credits.daily_login", rules.daily_login),
        ("credits.profile_complete", rules.profile_complete),
        ("credits.interaction", rules.interaction),
    ] {
        if value < 0 {
            return Err(LoadError::invalid(key, "bonus amounts must not be negative"));
        }
    }

    Ok(rules)
}

fn parse_sources(raw: &[String]) -> Result<Vec<FeedSource>, LoadError> {
    let mut sources = Vec::with_capacity(raw.len());
    for value in raw {
        let source = FeedSource::from_str(value)
            .map_err(|err| LoadError::invalid("feed.sources", err.to_string()))?;
        if sources.contains(&source) {
            return Err(LoadError::invalid(
                "feed.sources",
                format!("source `{source}` listed twice"),
            ));
        }
        sources.push(source);
    }
    Ok(sources)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    redis_url: Option<String>,
    connect_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    cache_key: Option<String>,
    ttl_seconds: Option<u64>,
    fetch_timeout_ms: Option<u64>,
    sources: Option<Vec<String>>,
    subreddits: Option<Vec<String>>,
    reddit_base_url: Option<String>,
    reddit_limit: Option<u32>,
    content_limit: Option<usize>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCreditSettings {
    daily_login: Option<i64>,
    profile_complete: Option<i64>,
    interaction: Option<i64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl CliArgs {
    /// The subcommand to run; `serve` when none was given.
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(Box::<ServeArgs>::default()))
    }
}
