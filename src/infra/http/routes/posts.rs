use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::application::pagination::{PageParams, Paginated};
use crate::application::repos::RepoError;
use crate::domain::saved::SavePostParams;

use crate::infra::http::AppState;
use crate::infra::http::error::ApiError;
use crate::infra::http::extract::CurrentUser;
use crate::infra::http::models::{
    MessageResponse, SavedPageResponse, SavedPostResponse, SharePostRequest, ShareResponse,
};

const SAVE_ACTION: &str = "save_post";
const SHARE_ACTION: &str = "share_post";

pub async fn save_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(params): Json<SavePostParams>,
) -> Result<(StatusCode, Json<SavedPostResponse>), ApiError> {
    if params.post_id.trim().is_empty() {
        return Err(ApiError::bad_request("postId is required", None));
    }

    let saved = state.saved_posts.save_post(user_id, params).await?;
    let award = state.ledger.award_interaction(user_id, SAVE_ACTION).await?;

    Ok((
        StatusCode::CREATED,
        Json(SavedPostResponse {
            message: "Post saved",
            saved,
            new_balance: award.new_balance,
        }),
    ))
}

pub async fn list_saved(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<SavedPageResponse>, ApiError> {
    let total = state.saved_posts.count_saved(user_id).await?;
    let items = state
        .saved_posts
        .list_saved(user_id, params.offset(), params.limit())
        .await?;
    Ok(Json(Paginated::from_page(items, total, &params).into()))
}

pub async fn unsave_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.saved_posts.unsave_post(user_id, &post_id).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Post removed from saved",
        })),
        Err(RepoError::NotFound) => Err(ApiError::not_found("Saved post not found")),
        Err(err) => Err(err.into()),
    }
}

pub async fn share_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<SharePostRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    let award = state.ledger.award_interaction(user_id, SHARE_ACTION).await?;

    info!(
        target = "creator_dashboard::http::posts",
        user_id,
        post_id = %request.post_id,
        source = request.source.map(|s| s.as_str()).unwrap_or(""),
        url = request.url.as_deref().unwrap_or(""),
        "Post shared"
    );

    Ok(Json(ShareResponse {
        message: "Share logged",
        new_balance: award.new_balance,
    }))
}
