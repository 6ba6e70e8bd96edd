//! Errors raised by the stock rules

use thiserror::Error;

/// Rule violations detected before anything is written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Missing or malformed input. `field` may list several comma-separated fields.
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Lot {lot_number} not found")]
    NotFound { lot_number: i64 },

    /// The resulting remaining length would leave `[0, original_length]`
    /// or the withdrawal would not remove anything, or its value overflows.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl StockError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StockError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type StockResult<T> = Result<T, StockError>;
