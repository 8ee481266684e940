use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use crate::domain::reports::NewReport;

use crate::infra::http::AppState;
use crate::infra::http::error::ApiError;
use crate::infra::http::extract::CurrentUser;
use crate::infra::http::models::{ReportCreatedResponse, ReportsResponse};

const REPORT_ACTION: &str = "report_post";

pub async fn create_report(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<NewReport>,
) -> Result<(StatusCode, Json<ReportCreatedResponse>), ApiError> {
    let report = state
        .reports
        .create_report(user_id, request.validated()?)
        .await?;
    let award = state.ledger.award_interaction(user_id, REPORT_ACTION).await?;

    info!(
        target = "creator_dashboard::http::reports",
        report_id = report.id,
        post_id = %report.post_id,
        source = report.source.as_str(),
        "Post reported"
    );

    Ok((
        StatusCode::CREATED,
        Json(ReportCreatedResponse {
            message: "Report submitted",
            report,
            new_balance: award.new_balance,
        }),
    ))
}

pub async fn my_reports(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ReportsResponse>, ApiError> {
    let reports = state.reports.list_reports(user_id).await?;
    Ok(Json(ReportsResponse { reports }))
}
