mod error;
mod extract;
mod middleware;
mod models;
mod routes;

pub use error::{ApiError, codes};
pub use extract::{CurrentUser, USER_ID_HEADER};

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::application::feed::FeedService;
use crate::application::ledger::CreditLedger;
use crate::application::repos::{AccountsRepo, ReportsRepo, SavedPostsRepo};
use crate::infra::db::PostgresRepositories;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub ledger: Arc<CreditLedger>,
    pub accounts: Arc<dyn AccountsRepo>,
    pub saved_posts: Arc<dyn SavedPostsRepo>,
    pub reports: Arc<dyn ReportsRepo>,
    /// Probed by `/healthz` when the service runs against Postgres.
    pub db: Option<Arc<PostgresRepositories>>,
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn healthz(State(state): State<AppState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/feed", get(routes::get_feed))
        .route("/api/feed/refresh", post(routes::refresh_feed))
        .route("/api/credits/balance", get(routes::balance))
        .route("/api/credits/history", get(routes::history))
        .route("/api/credits/daily-login", post(routes::daily_login))
        .route(
            "/api/profile",
            get(routes::get_profile).put(routes::update_profile),
        )
        .route("/api/posts/save", post(routes::save_post))
        .route("/api/posts/save/{post_id}", delete(routes::unsave_post))
        .route("/api/posts/saved", get(routes::list_saved))
        .route("/api/posts/share", post(routes::share_post))
        .route("/api/reports", post(routes::create_report))
        .route("/api/reports/mine", get(routes::my_reports))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
