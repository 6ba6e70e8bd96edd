//! Error handling for the bar stock ledger
//!
//! Every failure reaches the client as `{ "error": { code, message, field? } }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::StockError;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Storage errors
    #[error("Repository error: {0}")]
    Repository(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Validation { field, message } => AppError::Validation { field, message },
            StockError::NotFound { lot_number } => {
                AppError::NotFound(format!("Lot {}", lot_number))
            }
            StockError::InvalidQuantity(msg) => AppError::InvalidQuantity(msg),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Repository(other.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InvalidQuantity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_QUANTITY".to_string(),
                    message: msg.clone(),
                    field: Some("amount".to_string()),
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Repository(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "REPOSITORY_ERROR".to_string(),
                    message: "The stock store is unavailable, nothing was changed".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_map_to_statuses() {
        let cases = [
            (
                AppError::from(StockError::validation("supplier", "required")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(StockError::NotFound { lot_number: 4 }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(StockError::InvalidQuantity("too much".to_string())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(RepositoryError::Conflict("lot 1 changed".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(RepositoryError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_not_found_names_the_lot() {
        let err = AppError::from(StockError::NotFound { lot_number: 12 });
        assert_eq!(err.to_string(), "Resource not found: Lot 12");
    }
}
