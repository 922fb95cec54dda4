use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::handlers::json_body;
use crate::models::booking::BookingRequest;
use crate::models::payment::{CheckoutOutcome, PaymentCallback};
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::{created, success};

pub async fn begin_checkout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let outcome = state
        .bookings
        .begin_checkout(user_id, event_id, request)
        .await?;

    Ok(match outcome {
        CheckoutOutcome::Complete { .. } => created(outcome, "Booking confirmed"),
        CheckoutOutcome::AwaitingPayment { .. } => success(outcome, "Awaiting payment"),
    })
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<PaymentCallback>, JsonRejection>,
) -> AppResult<Response> {
    let callback = json_body(payload)?;
    let receipt = state.bookings.confirm_payment(user_id, callback).await?;
    Ok(created(receipt, "Booking confirmed"))
}

pub async fn cancel_checkout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let checkout = state.bookings.cancel_checkout(user_id, &order_id).await?;
    Ok(success(checkout, "Checkout closed"))
}
