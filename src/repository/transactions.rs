//! Book transactions repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::BookTransaction,
};

use super::ports::TransactionStore;

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All transactions of a borrower, most recent first
    pub async fn list_for_borrower(&self, borrower_reference: Uuid) -> AppResult<Vec<BookTransaction>> {
        let transactions = sqlx::query_as::<_, BookTransaction>(
            r#"
            SELECT * FROM book_transactions
            WHERE borrower_reference = $1
            ORDER BY transaction_date DESC
            "#,
        )
        .bind(borrower_reference)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }
}

#[async_trait]
impl TransactionStore for TransactionsRepository {
    async fn create(&self, transaction: BookTransaction) -> AppResult<BookTransaction> {
        let created = sqlx::query_as::<_, BookTransaction>(
            r#"
            INSERT INTO book_transactions (
                transaction_reference, book_reference, borrower_reference,
                transaction_date, status, return_date
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(transaction.transaction_reference)
        .bind(transaction.book_reference)
        .bind(transaction.borrower_reference)
        .bind(transaction.transaction_date)
        .bind(transaction.status)
        .bind(transaction.return_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(
        &self,
        transaction_reference: Uuid,
        transaction: BookTransaction,
    ) -> AppResult<BookTransaction> {
        let updated = sqlx::query_as::<_, BookTransaction>(
            r#"
            UPDATE book_transactions SET
                book_reference = $2, borrower_reference = $3,
                transaction_date = $4, status = $5, return_date = $6
            WHERE transaction_reference = $1 AND status = 'borrowed'
            RETURNING *
            "#,
        )
        .bind(transaction_reference)
        .bind(transaction.book_reference)
        .bind(transaction.borrower_reference)
        .bind(transaction.transaction_date)
        .bind(transaction.status)
        .bind(transaction.return_date)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(transaction) => Ok(transaction),
            // Missing row or already returned
            None => {
                self.get_by_reference(transaction_reference).await?;
                Err(AppError::ForbiddenOperation(format!(
                    "Book transaction {} is already returned",
                    transaction_reference
                )))
            }
        }
    }

    async fn get_by_reference(&self, transaction_reference: Uuid) -> AppResult<BookTransaction> {
        sqlx::query_as::<_, BookTransaction>(
            "SELECT * FROM book_transactions WHERE transaction_reference = $1",
        )
        .bind(transaction_reference)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Book transaction {} not found",
                transaction_reference
            ))
        })
    }
}
