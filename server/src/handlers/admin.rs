use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::Admin;
use crate::handlers::json_body;
use crate::models::admin::{ActionLogQuery, ResolveReportRequest};
use crate::models::event::ModerateEventRequest;
use crate::models::role::AssignRoleRequest;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::success;

pub async fn list_users(State(state): State<AppState>, _admin: Admin) -> AppResult<Response> {
    let users = state.admin.list_users().await?;
    Ok(success(users, "Users retrieved successfully"))
}

pub async fn assign_role(
    State(state): State<AppState>,
    admin: Admin,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let assignment = state
        .admin
        .assign_role(admin.user_id, user_id, request.role)
        .await?;
    Ok(success(assignment, "Role updated successfully"))
}

pub async fn list_events(State(state): State<AppState>, _admin: Admin) -> AppResult<Response> {
    let events = state.admin.list_events().await?;
    Ok(success(events, "Events retrieved successfully"))
}

pub async fn moderate_event(
    State(state): State<AppState>,
    admin: Admin,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<ModerateEventRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let event = state
        .admin
        .moderate_event(admin.user_id, event_id, request)
        .await?;
    Ok(success(event, "Event moderated successfully"))
}

pub async fn list_reports(State(state): State<AppState>, _admin: Admin) -> AppResult<Response> {
    let reports = state.admin.list_reports().await?;
    Ok(success(reports, "Reports retrieved successfully"))
}

pub async fn resolve_report(
    State(state): State<AppState>,
    admin: Admin,
    Path(report_id): Path<Uuid>,
    payload: Result<Json<ResolveReportRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let report = state
        .admin
        .resolve_report(admin.user_id, report_id, request.resolution)
        .await?;
    Ok(success(report, "Report resolved successfully"))
}

pub async fn list_actions(
    State(state): State<AppState>,
    _admin: Admin,
    Query(query): Query<ActionLogQuery>,
) -> AppResult<Response> {
    let actions = state.admin.actions(query.limit).await?;
    Ok(success(actions, "Admin actions retrieved successfully"))
}

pub async fn reconcile_checkouts(
    State(state): State<AppState>,
    admin: Admin,
) -> AppResult<Response> {
    let summary = state.bookings.reconcile_checkouts(admin.user_id).await?;
    Ok(success(summary, "Checkout reconciliation finished"))
}
