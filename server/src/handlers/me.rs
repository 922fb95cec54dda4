use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use crate::auth::{CurrentUser, MaybeUser};
use crate::handlers::json_body;
use crate::models::profile::UpdateProfileRequest;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::success;

pub async fn my_role(State(state): State<AppState>, MaybeUser(user_id): MaybeUser) -> Response {
    let resolution = state.roles.resolve(user_id).await;
    success(resolution.info, "Role resolved")
}

pub async fn my_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Response> {
    let profile = state.profiles.get(user_id).await?;
    Ok(success(profile, "Profile retrieved successfully"))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let profile = state.profiles.update(user_id, request).await?;
    Ok(success(profile, "Profile updated successfully"))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Response> {
    let bookings = state.profiles.bookings(user_id).await?;
    Ok(success(bookings, "Bookings retrieved successfully"))
}
