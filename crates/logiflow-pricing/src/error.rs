//! Error Types for Pricing

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PricingError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PricingError {
    #[error("Invalid input: {field} must not be negative (got {value})")]
    InvalidInput {
        field: &'static str,
        value: Decimal,
    },

    #[error("Invalid input: {0} is too large to quote")]
    Overflow(&'static str),
}
