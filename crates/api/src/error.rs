//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;
use ledger::LedgerError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Booking core error.
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Ledger error from run scheduling.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Booking(err) => booking_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String) {
    match &err {
        BookingError::TrainRunNotFound(_)
        | BookingError::StationNotFound { .. }
        | BookingError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        BookingError::SoldOut { .. }
        | BookingError::InvalidTransition { .. }
        | BookingError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        BookingError::InvalidInterval { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        // A downed dependency is never absence and never success.
        BookingError::Unavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        BookingError::Ledger { .. } | BookingError::Store { .. } => {
            tracing::error!(error = %err, "booking operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::RunNotScheduled(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::AlreadyScheduled(_)
        | LedgerError::SoldOut { .. }
        | LedgerError::SeatTaken { .. } => (StatusCode::CONFLICT, err.to_string()),
        LedgerError::InvalidInterval { .. }
        | LedgerError::IntervalOutOfBounds { .. }
        | LedgerError::RouteTooShort { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}
