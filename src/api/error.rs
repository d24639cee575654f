//! HTTP error responses
//!
//! Every failure leaves the API as `{success: false, error, code}` with a
//! status derived from the error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

/// API error with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn persistence_disabled() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "persistence_disabled",
            "Saved profiles and analyses are not available on this server",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<homefix_core::Error> for ApiError {
    fn from(err: homefix_core::Error) -> Self {
        use homefix_core::Error;

        let status = match &err {
            Error::InvalidInput(_) | Error::TooManyFiles { .. } => StatusCode::BAD_REQUEST,
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MalformedModelOutput(_) => StatusCode::BAD_GATEWAY,
            Error::GenerationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if err.is_user_correctable() {
            debug!(error = %err, "Request rejected");
        } else if status.is_server_error() && !matches!(err, Error::Internal(_)) {
            warn!(error = %err, code = err.code(), "Diagnosis failed upstream");
        } else {
            error!(error = %err, "Diagnosis failed");
        }

        Self::new(status, err.code(), err.user_message())
    }
}

impl From<homefix_store::Error> for ApiError {
    fn from(err: homefix_store::Error) -> Self {
        error!(error = %err, "Store error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
            "Database error",
        )
    }
}
