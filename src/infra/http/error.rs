use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{AppError, ErrorReport};
use crate::application::feed::FeedError;
use crate::application::ledger::LedgerError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const LEDGER: &str = "ledger_error";
    pub const CACHE: &str = "cache_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Authenticated user required",
            hint,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

fn code_for(err: &AppError) -> &'static str {
    match err {
        AppError::Repo(RepoError::Duplicate { .. }) => codes::DUPLICATE,
        AppError::Repo(RepoError::NotFound) | AppError::Ledger(LedgerError::NotFound { .. }) => {
            codes::NOT_FOUND
        }
        AppError::Repo(RepoError::InvalidInput { .. }) => codes::INVALID_INPUT,
        AppError::Repo(RepoError::Integrity { .. }) => codes::INTEGRITY,
        AppError::Repo(RepoError::Timeout) => codes::DB_TIMEOUT,
        AppError::Repo(RepoError::Persistence(_)) => codes::REPO,
        AppError::Ledger(LedgerError::Transaction(_)) => codes::LEDGER,
        AppError::Feed(FeedError::Cache(_)) => codes::CACHE,
        AppError::Domain(_) | AppError::Validation(_) => codes::BAD_REQUEST,
        AppError::Infra(_) | AppError::Unexpected(_) => codes::INTERNAL,
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status_code();
        // Server-side failures keep their detail in the logs only.
        let hint = (!status.is_server_error()).then(|| err.to_string());
        Self::new(status, code_for(&err), err.presentation_message(), hint)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        AppError::from(err).into()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        AppError::from(err).into()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        AppError::from(err).into()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_save_maps_to_conflict() {
        let err = ApiError::from(RepoError::Duplicate {
            constraint: "saved_posts_user_id_post_id_key".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), codes::DUPLICATE);
    }

    #[test]
    fn missing_account_maps_to_not_found() {
        let err = ApiError::from(LedgerError::NotFound { user_id: 9 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), codes::NOT_FOUND);
    }

    #[test]
    fn server_errors_hide_detail() {
        let err = ApiError::from(LedgerError::Transaction(RepoError::from_persistence(
            "connection reset",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.hint.is_none());
    }
}
