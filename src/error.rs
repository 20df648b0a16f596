//! Error types for Biblion server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes carried in every error response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    BadValue = 5,
    InsufficientCopies = 6,
    OutOfStock = 7,
    DuplicateReservation = 8,
    ReservationLimitReached = 9,
    IllegalTransition = 10,
    Conflict = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Insufficient copies: {0}")]
    InsufficientCopies(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Duplicate reservation: {0}")]
    DuplicateActive(String),

    #[error("Reservation limit reached: {0}")]
    LimitExceeded(String),

    #[error("Illegal status transition: {0}")]
    Transition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::InsufficientCopies(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InsufficientCopies, msg.clone())
            }
            AppError::OutOfStock(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::OutOfStock, msg.clone())
            }
            AppError::DuplicateActive(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::DuplicateReservation, msg.clone())
            }
            AppError::LimitExceeded(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ReservationLimitReached, msg.clone())
            }
            AppError::Transition(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::IllegalTransition, msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
