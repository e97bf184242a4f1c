//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        transaction::{CreateBookTransaction, ReturnBookTransaction},
        BookTransaction,
    },
};

use super::AuthenticatedUser;

/// Lend a book to a borrower
#[utoipa::path(
    post,
    path = "/transactions/borrow",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = CreateBookTransaction,
    responses(
        (status = 201, description = "Book borrowed", body = BookTransaction),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book unavailable, no copies left or already on loan to the borrower", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBookTransaction>,
) -> AppResult<(StatusCode, Json<BookTransaction>)> {
    tracing::debug!(
        "Borrow of book {} for {} requested by {}",
        data.book_reference,
        data.borrower_reference,
        claims.sub
    );

    let transaction = state.services.transactions.borrow_book(data).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/transactions/{reference}/return",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Transaction reference")
    ),
    request_body = ReturnBookTransaction,
    responses(
        (status = 200, description = "Book returned", body = BookTransaction),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transaction already returned", body = crate::error::ErrorResponse),
        (status = 422, description = "Borrower has no open loan of the book", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reference): Path<Uuid>,
    Json(data): Json<ReturnBookTransaction>,
) -> AppResult<Json<BookTransaction>> {
    tracing::debug!("Return of transaction {} requested by {}", reference, claims.sub);

    let transaction = state
        .services
        .transactions
        .return_book(reference, data.return_date)
        .await?;
    Ok(Json(transaction))
}

#[utoipa::path(
    get,
    path = "/transactions/{reference}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Transaction reference")
    ),
    responses(
        (status = 200, description = "Transaction details", body = BookTransaction),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_transaction(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<BookTransaction>> {
    let transaction = state.services.transactions.get_by_reference(reference).await?;
    Ok(Json(transaction))
}
