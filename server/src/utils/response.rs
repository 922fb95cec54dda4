use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

fn envelope<T: Serialize>(status: StatusCode, data: Option<T>, message: String) -> Response {
    let body = ApiResponse {
        success: true,
        data,
        message: Some(message),
    };
    (status, Json(body)).into_response()
}

pub fn success<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    envelope(StatusCode::OK, Some(data), message.into())
}

pub fn created<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    envelope(StatusCode::CREATED, Some(data), message.into())
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}

/// Bare `{"error": ...}` body used by the payment function endpoints, whose
/// callers expect the gateway-facing wire shape rather than the envelope.
pub fn function_error(message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
