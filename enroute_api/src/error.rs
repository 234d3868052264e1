use aide::OperationOutput;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use enroute_tracking::error::TrackingError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    PayloadTooLarge(String),
    InternalServerError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<TrackingError> for ApiError {
    fn from(error: TrackingError) -> Self {
        match error {
            TrackingError::Validation(_) => ApiError::BadRequest(error.to_string()),
            TrackingError::Unauthenticated => ApiError::Unauthorized(error.to_string()),
            TrackingError::Forbidden(_) => ApiError::Forbidden(error.to_string()),
            TrackingError::OrderNotFound(_) => ApiError::NotFound(error.to_string()),
            // already logged where the dependency failed
            TrackingError::Dependency(_) => {
                ApiError::InternalServerError(String::from("Failed to persist tracking data"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::PayloadTooLarge(message) => (StatusCode::PAYLOAD_TOO_LARGE, message),
            ApiError::InternalServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl OperationOutput for ApiError {
    type Inner = Self;
}
