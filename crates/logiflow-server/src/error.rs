//! HTTP Error Responses

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use logiflow_payments::PaymentError;
use logiflow_pricing::PricingError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Error returned by JSON handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Admin token required")
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", error)
    }
}

/// HTTP status for a payment error
pub const fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::Validation(_)
        | PaymentError::Signature(_)
        | PaymentError::WebhookParse(_)
        | PaymentError::AmountMismatch => StatusCode::BAD_REQUEST,
        PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::Conflict(_) => StatusCode::CONFLICT,
        PaymentError::Unavailable(_)
        | PaymentError::Provider(_)
        | PaymentError::Storage(_)
        | PaymentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let status = payment_status(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "Payment operation failed");
        } else {
            tracing::debug!(error = %err, "Payment request rejected");
        }

        let error = match &err {
            PaymentError::NotFound(_) => "Payment not found".to_string(),
            other => other.to_string(),
        };
        Self::new(status, err.code(), error)
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "MULTIPART_ERROR", err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.error,
                code: self.code.into(),
            }),
        )
            .into_response()
    }
}
