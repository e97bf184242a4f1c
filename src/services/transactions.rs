//! Borrow/return workflow over the book, borrower and transaction ports
//!
//! A workflow either completes every step or undoes the steps it already
//! applied before returning the error of the failing step.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::{
    config::LoanPolicy,
    error::{AppError, AppResult},
    models::{BookBorrowed, BookTransaction, CreateBookTransaction},
    repository::ports::{BookAvailability, BorrowerRecords, TransactionStore},
};

#[derive(Clone)]
pub struct TransactionsService {
    books: Arc<dyn BookAvailability>,
    borrowers: Arc<dyn BorrowerRecords>,
    transactions: Arc<dyn TransactionStore>,
    policy: LoanPolicy,
}

impl TransactionsService {
    pub fn new(
        books: Arc<dyn BookAvailability>,
        borrowers: Arc<dyn BorrowerRecords>,
        transactions: Arc<dyn TransactionStore>,
        policy: LoanPolicy,
    ) -> Self {
        Self {
            books,
            borrowers,
            transactions,
            policy,
        }
    }

    /// Lend one copy of a book to a borrower
    pub async fn borrow_book(&self, data: CreateBookTransaction) -> AppResult<BookTransaction> {
        let book_reference = data.book_reference;
        let borrower_reference = data.borrower_reference;

        let book = self
            .books
            .get_by_reference(book_reference)
            .await
            .map_err(|e| unavailable_if_missing(e, book_reference))?;

        if book.is_deleted || !book.has_available_copy() {
            return Err(AppError::BookUnavailable(book_reference.to_string()));
        }

        let borrower = self
            .borrowers
            .get_by_reference(borrower_reference)
            .await
            .map_err(|e| borrower_not_found_if_missing(e, borrower_reference))?;

        if borrower.is_deleted {
            return Err(AppError::BorrowerNotFound(borrower_reference.to_string()));
        }

        if !self.policy.allow_duplicate_open_loans && borrower.has_open_loan(book_reference) {
            return Err(AppError::DuplicateOpenLoan(format!(
                "borrower {} already holds book {}",
                borrower_reference, book_reference
            )));
        }

        tracing::debug!("Borrow: decreasing available copies of book {}", book_reference);
        self.books
            .decrease_available_copies(book_reference)
            .await
            .map_err(|e| match e {
                AppError::ForbiddenOperation(_) => {
                    AppError::NoAvailableCopies(book_reference.to_string())
                }
                other => unavailable_if_missing(other, book_reference),
            })?;

        // Stored timestamps keep microseconds, so the entry can be matched again on undo
        let entry = BookBorrowed::open(book_reference, Utc::now().trunc_subsecs(6));

        tracing::debug!("Borrow: adding loan entry to borrower {}", borrower_reference);
        let added = if self.policy.allow_duplicate_open_loans {
            self.borrowers
                .add_borrowed_entry(borrower_reference, entry.clone())
                .await
        } else {
            self.borrowers
                .add_exclusive_borrowed_entry(borrower_reference, entry.clone())
                .await
        };
        if let Err(e) = added {
            tracing::warn!(
                "Borrow of book {} by {} failed adding loan entry, restoring copy: {}",
                book_reference,
                borrower_reference,
                e
            );
            self.restore_copy(book_reference).await;
            return Err(match e {
                // Another borrow of the same book by this borrower got there first
                AppError::ForbiddenOperation(_) => AppError::DuplicateOpenLoan(format!(
                    "borrower {} already holds book {}",
                    borrower_reference, book_reference
                )),
                other => borrower_not_found_if_missing(other, borrower_reference),
            });
        }

        tracing::debug!("Borrow: recording transaction");
        let transaction = match self.transactions.create(BookTransaction::borrowed(&data)).await {
            Ok(transaction) => transaction,
            Err(e) => {
                tracing::warn!(
                    "Borrow of book {} by {} failed recording transaction, undoing: {}",
                    book_reference,
                    borrower_reference,
                    e
                );
                log_undo(
                    "remove loan entry",
                    self.borrowers
                        .remove_borrowed_entry(borrower_reference, entry)
                        .await,
                );
                self.restore_copy(book_reference).await;
                return Err(e);
            }
        };

        tracing::info!(
            "Book {} borrowed by {} (transaction {})",
            book_reference,
            borrower_reference,
            transaction.transaction_reference
        );
        Ok(transaction)
    }

    /// Bring a borrowed copy back and close the transaction
    pub async fn return_book(
        &self,
        transaction_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> AppResult<BookTransaction> {
        let mut transaction = self.get_by_reference(transaction_reference).await?;

        if transaction.is_returned() {
            return Err(AppError::AlreadyReturned(transaction_reference.to_string()));
        }

        let book_reference = transaction.book_reference;
        let borrower_reference = transaction.borrower_reference;

        tracing::debug!("Return: closing loan entry of borrower {}", borrower_reference);
        let closed = self
            .borrowers
            .close_borrowed_entry(borrower_reference, book_reference, return_date)
            .await
            .map_err(|e| match e {
                AppError::ForbiddenOperation(_) => AppError::NoMatchingBorrowRecord {
                    borrower_reference,
                    book_reference,
                },
                other => borrower_not_found_if_missing(other, borrower_reference),
            })?;

        tracing::debug!("Return: increasing available copies of book {}", book_reference);
        if let Err(e) = self.books.increase_available_copies(book_reference).await {
            tracing::warn!(
                "Return of transaction {} failed restoring copy, reopening loan entry: {}",
                transaction_reference,
                e
            );
            self.reopen_entry(borrower_reference, closed).await;
            return Err(e);
        }

        transaction.mark_returned(return_date)?;

        tracing::debug!("Return: updating transaction {}", transaction_reference);
        let updated = match self
            .transactions
            .update(transaction_reference, transaction)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(
                    "Return of transaction {} failed updating record, undoing: {}",
                    transaction_reference,
                    e
                );
                log_undo(
                    "take copy back",
                    self.books.decrease_available_copies(book_reference).await,
                );
                self.reopen_entry(borrower_reference, closed).await;
                return Err(match e {
                    AppError::NotFound(_) => {
                        AppError::TransactionNotFound(transaction_reference.to_string())
                    }
                    // A concurrent return of the same transaction won
                    AppError::ForbiddenOperation(_) => {
                        AppError::AlreadyReturned(transaction_reference.to_string())
                    }
                    other => other,
                });
            }
        };

        tracing::info!(
            "Book {} returned by {} (transaction {})",
            book_reference,
            borrower_reference,
            transaction_reference
        );
        Ok(updated)
    }

    pub async fn get_by_reference(&self, transaction_reference: Uuid) -> AppResult<BookTransaction> {
        self.transactions
            .get_by_reference(transaction_reference)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::TransactionNotFound(transaction_reference.to_string())
                }
                other => other,
            })
    }

    async fn restore_copy(&self, book_reference: Uuid) {
        log_undo(
            "restore copy",
            self.books.increase_available_copies(book_reference).await,
        );
    }

    async fn reopen_entry(&self, borrower_reference: Uuid, closed: BookBorrowed) {
        log_undo(
            "reopen loan entry",
            self.borrowers
                .reopen_borrowed_entry(borrower_reference, closed)
                .await,
        );
    }
}

fn unavailable_if_missing(e: AppError, book_reference: Uuid) -> AppError {
    match e {
        AppError::NotFound(_) => AppError::BookUnavailable(book_reference.to_string()),
        other => other,
    }
}

fn borrower_not_found_if_missing(e: AppError, borrower_reference: Uuid) -> AppError {
    match e {
        AppError::NotFound(_) => AppError::BorrowerNotFound(borrower_reference.to_string()),
        other => other,
    }
}

fn log_undo<T>(step: &str, result: AppResult<T>) {
    if let Err(e) = result {
        tracing::error!("Undo step '{}' failed, records may be inconsistent: {}", step, e);
    }
}
