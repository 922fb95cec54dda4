//! The two payment functions keep the gateway-facing wire shapes: the raw
//! order object or `{valid}` on success, `{error}` with a 500 otherwise.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use crate::auth::CurrentUser;
use crate::models::payment::{CreateOrderRequest, PaymentCallback, VerifyResponse};
use crate::services::payments::initiate_order;
use crate::state::AppState;
use crate::utils::response::function_error;

pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return function_error(rejection.body_text()),
    };

    match initiate_order(state.gateway.as_ref(), request).await {
        Ok(order) => {
            info!(%user_id, order_id = %order.id, "Payment order created");
            Json(order).into_response()
        }
        Err(e) => {
            error!(%user_id, error = %e, "Error creating payment order");
            function_error(e.to_string())
        }
    }
}

pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentCallback>, JsonRejection>,
) -> Response {
    let callback = match payload {
        Ok(Json(callback)) => callback,
        Err(rejection) => return function_error(rejection.body_text()),
    };

    match state.verifier.verify(&callback) {
        Ok(valid) => {
            info!(order_id = %callback.razorpay_order_id, valid, "Payment signature checked");
            Json(VerifyResponse { valid }).into_response()
        }
        Err(e) => {
            error!(error = %e, "Error verifying payment");
            function_error(e.to_string())
        }
    }
}
