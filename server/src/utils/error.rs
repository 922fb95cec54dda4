use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::booking::InvalidTransition;
use crate::services::payments::{GatewayError, SignatureError};
use crate::store::StoreError;
use crate::utils::response::error as error_response;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment verification failed: {0}")]
    PaymentVerification(String),

    #[error("Database error")]
    DatabaseError(#[source] StoreError),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentVerification(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::PaymentVerification(_) => "PAYMENT_VERIFICATION_FAILED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PaymentVerification(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::ExternalServiceError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound {
                resource,
                identifier,
            } => AppError::NotFound(format!("{resource} {identifier} was not found")),
            StoreError::CapacityExceeded {
                event_id,
                requested,
            } => AppError::Conflict(format!(
                "Event {event_id} does not have {requested} ticket(s) left"
            )),
            StoreError::CheckoutStateChanged { checkout_id, .. } => AppError::Conflict(format!(
                "Checkout {checkout_id} was changed by another request"
            )),
            e => AppError::DatabaseError(e),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::InvalidOrder(msg) => AppError::ValidationError(msg),
            e => AppError::ExternalServiceError(e.to_string()),
        }
    }
}

impl From<SignatureError> for AppError {
    fn from(value: SignatureError) -> Self {
        match value {
            SignatureError::MalformedInput(field) => {
                AppError::ValidationError(format!("{field} must not be empty"))
            }
            e => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(value: InvalidTransition) -> Self {
        AppError::InternalServerError(value.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PaymentVerification(msg)
            | AppError::ExternalServiceError(msg) => msg.clone(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
