//! Content source adapters.

mod curated;
mod reddit;

use std::sync::Arc;

use crate::{
    application::{clock::Clock, sources::SourceProvider},
    config::FeedSettings,
    domain::posts::FeedSource,
    infra::error::InfraError,
};

pub use curated::CuratedSource;
pub use reddit::{RedditSource, parse_listing};

/// Build one provider per configured source, sharing a single HTTP client.
pub fn build_providers(
    settings: &FeedSettings,
    clock: Arc<dyn Clock>,
) -> Result<Vec<Arc<dyn SourceProvider>>, InfraError> {
    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.fetch_timeout)
        .build()?;

    let providers = settings
        .sources
        .iter()
        .map(|source| -> Arc<dyn SourceProvider> {
            match source {
                FeedSource::Reddit => Arc::new(RedditSource::new(client.clone(), settings)),
                FeedSource::Twitter => Arc::new(CuratedSource::twitter(
                    clock.clone(),
                    settings.content_limit,
                )),
                FeedSource::Linkedin => Arc::new(CuratedSource::linkedin(
                    clock.clone(),
                    settings.content_limit,
                )),
            }
        })
        .collect();
    Ok(providers)
}
