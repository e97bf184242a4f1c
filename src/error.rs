//! Error types for the LMS server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Stable numeric error codes exposed in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    BadValue = 5,
    Duplicate = 6,
    BookUnavailable = 10,
    NoAvailableCopies = 11,
    NoSuchBorrower = 12,
    NoSuchTransaction = 13,
    NoMatchingBorrowRecord = 14,
    AlreadyReturned = 15,
    ForbiddenOperation = 16,
    DuplicateOpenLoan = 17,
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

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// Precondition check: the book is missing or has no copy left
    #[error("Book not available for borrowing: {0}")]
    BookUnavailable(String),

    /// Authoritative check at decrement time
    #[error("No available copies to borrow: {0}")]
    NoAvailableCopies(String),

    #[error("Borrower not found: {0}")]
    BorrowerNotFound(String),

    #[error("Book transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("No open loan of book {book_reference} for borrower {borrower_reference}")]
    NoMatchingBorrowRecord {
        borrower_reference: Uuid,
        book_reference: Uuid,
    },

    #[error("Book transaction already returned: {0}")]
    AlreadyReturned(String),

    /// Entity-level invariant violation (copy counts, borrowed list)
    #[error("Forbidden operation: {0}")]
    ForbiddenOperation(String),

    #[error("Borrower already has an open loan of this book: {0}")]
    DuplicateOpenLoan(String),
}

impl AppError {
    /// HTTP status and public error code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord),
            AppError::Validation(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue)
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
            AppError::BookUnavailable(_) => (StatusCode::CONFLICT, ErrorCode::BookUnavailable),
            AppError::NoAvailableCopies(_) => (StatusCode::CONFLICT, ErrorCode::NoAvailableCopies),
            AppError::BorrowerNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBorrower),
            AppError::TransactionNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchTransaction)
            }
            AppError::NoMatchingBorrowRecord { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::NoMatchingBorrowRecord,
            ),
            AppError::AlreadyReturned(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyReturned),
            AppError::ForbiddenOperation(_) => {
                (StatusCode::FORBIDDEN, ErrorCode::ForbiddenOperation)
            }
            AppError::DuplicateOpenLoan(_) => (StatusCode::CONFLICT, ErrorCode::DuplicateOpenLoan),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Unique reference of this error occurrence, also written to the logs
    pub error_reference: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let error_reference = Uuid::new_v4();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(%error_reference, "Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(%error_reference, "Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => {
                tracing::warn!(%error_reference, status = status.as_u16(), "{}", other);
                other.to_string()
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            error_reference,
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
