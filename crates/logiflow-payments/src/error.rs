//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment lifecycle errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// No payment request with this reference
    #[error("Payment not found: {0}")]
    NotFound(String),

    /// Requested transition is not allowed from the current state
    #[error("{0}")]
    Conflict(String),

    /// A required integration is not configured
    #[error("{0}")]
    Unavailable(String),

    /// Stripe API error
    #[error("{0}")]
    Provider(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    Signature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Bank notification amount disagrees with the stored amount
    #[error("Amount mismatch")]
    AmountMismatch,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Stable machine-readable error code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Signature(_) => "INVALID_SIGNATURE",
            Self::WebhookParse(_) => "WEBHOOK_PARSE_ERROR",
            Self::AmountMismatch => "AMOUNT_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<std::io::Error> for PaymentError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
