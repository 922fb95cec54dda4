use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success;

pub mod admin;
pub mod bookings;
pub mod events;
pub mod me;
pub mod payments;
pub mod reports;
pub mod tickets;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "ticketing-api",
    };

    success(payload, "Health check successful")
}

/// Unwraps a JSON body, turning axum's plain-text rejection into the
/// enveloped validation error.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}
