use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every dashboard metric with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "dashboard_feed_cache_hit_total",
            Unit::Count,
            "Unified feed reads served from cache."
        );
        describe_counter!(
            "dashboard_feed_cache_miss_total",
            Unit::Count,
            "Unified feed reads that had to aggregate from sources."
        );
        describe_counter!(
            "dashboard_feed_cache_error_total",
            Unit::Count,
            "Cache backend errors absorbed by the feed aggregator."
        );
        describe_counter!(
            "dashboard_feed_source_error_total",
            Unit::Count,
            "Source fetches that failed or timed out, by source."
        );
        describe_histogram!(
            "dashboard_feed_fetch_ms",
            Unit::Milliseconds,
            "Wall time of one full source fan-out in milliseconds."
        );
        describe_gauge!(
            "dashboard_feed_posts",
            Unit::Count,
            "Posts in the most recently aggregated feed."
        );
        describe_counter!(
            "dashboard_ledger_mutation_total",
            Unit::Count,
            "Committed credit mutations, by entry type."
        );
        describe_counter!(
            "dashboard_ledger_bonus_skipped_total",
            Unit::Count,
            "Bonus requests declined because the bonus was already granted."
        );
    });
}
