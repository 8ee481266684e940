use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the dashboard binary.
#[derive(Debug, Parser)]
#[command(
    name = "creator-dashboard",
    version,
    about = "Creator dashboard: unified feed and credit ledger"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DASHBOARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Aggregate the feed once and print it as JSON.
    Feed(FeedArgs),
    /// Apply an operator credit adjustment to one account.
    Adjust(AdjustArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheOverride {
    /// Override the networked cache URL.
    #[arg(long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub cache: CacheOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the feed cache TTL.
    #[arg(long = "feed-ttl-seconds", value_name = "SECONDS")]
    pub feed_ttl_seconds: Option<u64>,

    /// Override the per-source fetch timeout.
    #[arg(long = "feed-fetch-timeout-ms", value_name = "MILLIS")]
    pub feed_fetch_timeout_ms: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FeedArgs {
    #[command(flatten)]
    pub cache: CacheOverride,

    /// Drop the cached feed before aggregating.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub refresh: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AdjustArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Account to adjust.
    #[arg(long = "user-id", value_name = "ID")]
    pub user_id: i64,

    /// Signed credit delta.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub amount: i64,

    /// Reason recorded in the credit history.
    #[arg(long, value_name = "TEXT")]
    pub reason: String,
}
