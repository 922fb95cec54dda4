use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use crate::auth::CurrentUser;
use crate::handlers::json_body;
use crate::models::admin::CreateReportRequest;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::created;

pub async fn file_report(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let report = state.reports.file(user_id, request).await?;
    Ok(created(report, "Report submitted"))
}
