//! In-memory implementation of the workflow ports
//!
//! Each port operation runs under a single write lock, so the
//! check-then-mutate guards on books and borrowers behave like the
//! conditional updates of the PostgreSQL repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookBorrowed, BookTransaction, Borrower},
};

use super::ports::{BookAvailability, BorrowerRecords, TransactionStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<HashMap<Uuid, Book>>,
    borrowers: RwLock<HashMap<Uuid, Borrower>>,
    transactions: RwLock<HashMap<Uuid, BookTransaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a book
    pub async fn insert_book(&self, book: Book) {
        self.books.write().await.insert(book.book_reference, book);
    }

    /// Insert or replace a borrower
    pub async fn insert_borrower(&self, borrower: Borrower) {
        self.borrowers
            .write()
            .await
            .insert(borrower.borrower_reference, borrower);
    }

    pub async fn transactions(&self) -> Vec<BookTransaction> {
        self.transactions.read().await.values().cloned().collect()
    }
}

fn book_not_found(book_reference: Uuid) -> AppError {
    AppError::NotFound(format!("Book {} not found", book_reference))
}

fn borrower_not_found(borrower_reference: Uuid) -> AppError {
    AppError::NotFound(format!("Borrower {} not found", borrower_reference))
}

#[async_trait]
impl BookAvailability for MemoryStore {
    async fn get_by_reference(&self, book_reference: Uuid) -> AppResult<Book> {
        self.books
            .read()
            .await
            .get(&book_reference)
            .cloned()
            .ok_or_else(|| book_not_found(book_reference))
    }

    async fn increase_available_copies(&self, book_reference: Uuid) -> AppResult<Book> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&book_reference)
            .ok_or_else(|| book_not_found(book_reference))?;
        book.increase_available_copies()?;
        Ok(book.clone())
    }

    async fn decrease_available_copies(&self, book_reference: Uuid) -> AppResult<Book> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&book_reference)
            .ok_or_else(|| book_not_found(book_reference))?;
        book.decrease_available_copies()?;
        Ok(book.clone())
    }
}

#[async_trait]
impl BorrowerRecords for MemoryStore {
    async fn get_by_reference(&self, borrower_reference: Uuid) -> AppResult<Borrower> {
        self.borrowers
            .read()
            .await
            .get(&borrower_reference)
            .cloned()
            .ok_or_else(|| borrower_not_found(borrower_reference))
    }

    async fn add_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let mut borrowers = self.borrowers.write().await;
        borrowers
            .get_mut(&borrower_reference)
            .ok_or_else(|| borrower_not_found(borrower_reference))?
            .borrow_book(entry);
        Ok(())
    }

    async fn add_exclusive_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let mut borrowers = self.borrowers.write().await;
        borrowers
            .get_mut(&borrower_reference)
            .ok_or_else(|| borrower_not_found(borrower_reference))?
            .borrow_book_exclusive(entry)
    }

    async fn close_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        book_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> AppResult<BookBorrowed> {
        let mut borrowers = self.borrowers.write().await;
        borrowers
            .get_mut(&borrower_reference)
            .ok_or_else(|| borrower_not_found(borrower_reference))?
            .return_book(book_reference, return_date)
    }

    async fn remove_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let mut borrowers = self.borrowers.write().await;
        let borrower = borrowers
            .get_mut(&borrower_reference)
            .ok_or_else(|| borrower_not_found(borrower_reference))?;

        if !borrower.remove_entry(&entry) {
            return Err(AppError::NotFound(format!(
                "No open loan of book {} for borrower {}",
                entry.book_reference, borrower_reference
            )));
        }
        Ok(())
    }

    async fn reopen_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let mut borrowers = self.borrowers.write().await;
        let borrower = borrowers
            .get_mut(&borrower_reference)
            .ok_or_else(|| borrower_not_found(borrower_reference))?;

        if !borrower.reopen_entry(&entry) {
            return Err(AppError::NotFound(format!(
                "No closed loan of book {} for borrower {}",
                entry.book_reference, borrower_reference
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, transaction: BookTransaction) -> AppResult<BookTransaction> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&transaction.transaction_reference) {
            return Err(AppError::Conflict(format!(
                "Book transaction {} already exists",
                transaction.transaction_reference
            )));
        }
        transactions.insert(transaction.transaction_reference, transaction.clone());
        Ok(transaction)
    }

    async fn update(
        &self,
        transaction_reference: Uuid,
        transaction: BookTransaction,
    ) -> AppResult<BookTransaction> {
        let mut transactions = self.transactions.write().await;
        let stored = transactions.get_mut(&transaction_reference).ok_or_else(|| {
            AppError::NotFound(format!(
                "Book transaction {} not found, update failed",
                transaction_reference
            ))
        })?;
        if stored.is_returned() {
            return Err(AppError::ForbiddenOperation(format!(
                "Book transaction {} is already returned",
                transaction_reference
            )));
        }
        *stored = BookTransaction {
            transaction_reference,
            ..transaction
        };
        Ok(stored.clone())
    }

    async fn get_by_reference(&self, transaction_reference: Uuid) -> AppResult<BookTransaction> {
        self.transactions
            .read()
            .await
            .get(&transaction_reference)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Book transaction {} not found",
                    transaction_reference
                ))
            })
    }
}
