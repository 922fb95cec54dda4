use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::Organizer;
use crate::handlers::json_body;
use crate::models::event::CreateEventRequest;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::{created, success};

pub async fn list_events(State(state): State<AppState>) -> AppResult<Response> {
    let events = state.events.list_active().await?;
    Ok(success(events, "Events retrieved successfully"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    let event = state.events.get_active(event_id).await?;
    Ok(success(event, "Event retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    organizer: Organizer,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let event = state.events.create(organizer.user_id, request).await?;
    Ok(created(event, "Event created successfully"))
}
