use axum::extract::{Path, State};
use axum::response::Response;

use crate::auth::Organizer;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::success;

pub async fn get_ticket(
    State(state): State<AppState>,
    _organizer: Organizer,
    Path(qr_code): Path<String>,
) -> AppResult<Response> {
    let outcome = state.tickets.lookup(&qr_code).await?;
    Ok(success(outcome, "Ticket lookup complete"))
}

pub async fn validate_ticket(
    State(state): State<AppState>,
    organizer: Organizer,
    Path(qr_code): Path<String>,
) -> AppResult<Response> {
    let outcome = state.tickets.validate(&qr_code, organizer.user_id).await?;
    Ok(success(outcome, "Ticket validation complete"))
}
