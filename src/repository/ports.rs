//! Storage ports consumed by the borrow/return workflow
//!
//! Each port reports a missing record as [`AppError::NotFound`] and an
//! entity invariant violation as [`AppError::ForbiddenOperation`]. The
//! transaction service relabels those into workflow errors.
//!
//! [`AppError::NotFound`]: crate::error::AppError::NotFound
//! [`AppError::ForbiddenOperation`]: crate::error::AppError::ForbiddenOperation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookBorrowed, BookTransaction, Borrower},
};

/// Book copy-count adapter
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookAvailability: Send + Sync {
    async fn get_by_reference(&self, book_reference: Uuid) -> AppResult<Book>;

    /// Fails with ForbiddenOperation when every copy is already on the shelf
    async fn increase_available_copies(&self, book_reference: Uuid) -> AppResult<Book>;

    /// Fails with ForbiddenOperation when no copy is left
    async fn decrease_available_copies(&self, book_reference: Uuid) -> AppResult<Book>;
}

/// Borrower loan-history adapter
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowerRecords: Send + Sync {
    async fn get_by_reference(&self, borrower_reference: Uuid) -> AppResult<Borrower>;

    async fn add_borrowed_entry(&self, borrower_reference: Uuid, entry: BookBorrowed)
        -> AppResult<()>;

    /// Like `add_borrowed_entry`, but fails with ForbiddenOperation when the
    /// borrower already has an open entry for the same book. The check and
    /// the append are atomic.
    async fn add_exclusive_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()>;

    /// Stamps the earliest open entry for the book and returns it.
    /// Fails with ForbiddenOperation when the borrower has no open loan of it.
    async fn close_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        book_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> AppResult<BookBorrowed>;

    /// Undo of `add_borrowed_entry`
    async fn remove_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()>;

    /// Undo of `close_borrowed_entry`
    async fn reopen_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()>;
}

/// Book transaction persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, transaction: BookTransaction) -> AppResult<BookTransaction>;

    /// Fails with ForbiddenOperation when the stored transaction is already
    /// Returned, so a transition is applied at most once.
    async fn update(
        &self,
        transaction_reference: Uuid,
        transaction: BookTransaction,
    ) -> AppResult<BookTransaction>;

    async fn get_by_reference(&self, transaction_reference: Uuid) -> AppResult<BookTransaction>;
}
