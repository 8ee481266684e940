use axum::Json;
use axum::extract::{Query, State};

use crate::application::ledger::BonusOutcome;
use crate::application::pagination::{PageParams, Paginated};
use crate::domain::credits::{CreditAccount, UserId, UserProfile};

use crate::infra::http::AppState;
use crate::infra::http::error::ApiError;
use crate::infra::http::extract::CurrentUser;
use crate::infra::http::models::{
    BalanceResponse, HistoryPageResponse, ProfileResponse, ProfileUpdateRequest, UserResponse,
    UserView,
};

async fn load_account(state: &AppState, user_id: UserId) -> Result<CreditAccount, ApiError> {
    state
        .accounts
        .find_account(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn balance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = load_account(&state, user_id).await?;
    Ok(Json(BalanceResponse {
        credits: account.credits,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<HistoryPageResponse>, ApiError> {
    let total = state.accounts.count_history(user_id).await?;
    let items = state
        .accounts
        .list_history(user_id, params.offset(), params.limit())
        .await?;
    Ok(Json(Paginated::from_page(items, total, &params).into()))
}

pub async fn daily_login(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<BonusOutcome>, ApiError> {
    let account = load_account(&state, user_id).await?;
    let outcome = state.ledger.award_daily_login(&account).await?;
    Ok(Json(outcome))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let account = load_account(&state, user_id).await?;
    let profile = state
        .accounts
        .find_profile(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserResponse {
        user: UserView { account, profile },
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = load_account(&state, user_id).await?;
    let profile = state
        .accounts
        .update_profile(user_id, &UserProfile::from(request))
        .await?;

    let profile_bonus = if profile.is_complete() && !account.is_profile_complete {
        Some(state.ledger.award_profile_complete(&account).await?)
    } else {
        None
    };

    Ok(Json(ProfileResponse {
        profile,
        profile_bonus,
    }))
}
