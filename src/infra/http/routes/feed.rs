use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};

use crate::application::pagination::Paginated;
use crate::domain::posts::FeedSource;

use crate::infra::http::error::ApiError;
use crate::infra::http::models::{FeedPageResponse, FeedQuery, FeedRefreshResponse};
use crate::infra::http::AppState;

pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, ApiError> {
    let source = match query.source.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            FeedSource::from_str(raw)
                .map_err(|err| ApiError::bad_request("Unknown feed source", Some(err.to_string())))?,
        ),
    };

    let mut posts = state.feed.get_unified_feed().await;
    if let Some(source) = source {
        posts.retain(|post| post.source == source);
    }

    let page = Paginated::slice(&posts, &query.page_params());
    Ok(Json(page.into()))
}

pub async fn refresh_feed(
    State(state): State<AppState>,
) -> Result<Json<FeedRefreshResponse>, ApiError> {
    state.feed.invalidate_feed_cache().await?;
    let posts = state.feed.get_unified_feed().await;
    Ok(Json(FeedRefreshResponse {
        message: "Feed refreshed",
        total: posts.len(),
    }))
}
