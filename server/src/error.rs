use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid zip code: {0}")]
    InvalidZipCode(String),

    #[error("No forecast available for {0}")]
    ForecastUnavailable(String),

    #[error("Bad response from weather library: {0}")]
    BadForeignResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidZipCode(_) => (StatusCode::BAD_REQUEST, "INVALID_ZIP_CODE"),
            ApiError::ForecastUnavailable(_) => (StatusCode::NOT_FOUND, "FORECAST_UNAVAILABLE"),
            ApiError::BadForeignResponse(_) => (StatusCode::BAD_GATEWAY, "BAD_FOREIGN_RESPONSE"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match &self {
            ApiError::InvalidZipCode(msg)
            | ApiError::ForecastUnavailable(msg)
            | ApiError::BadForeignResponse(msg)
            | ApiError::Timeout(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ffi_bridge::Error> for ApiError {
    fn from(err: ffi_bridge::Error) -> Self {
        match err {
            ffi_bridge::Error::Decode(msg) => ApiError::BadForeignResponse(msg),
            ffi_bridge::Error::MissingResponse => {
                ApiError::ForecastUnavailable("requested location".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
