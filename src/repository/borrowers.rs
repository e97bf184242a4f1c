//! Borrowers repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrower::BorrowerRow,
        BookBorrowed, Borrower, PageQuery, RecordFilter,
    },
};

use super::ports::BorrowerRecords;

/// Loan entry row tagged with its borrower, for batch loading
#[derive(FromRow)]
struct EntryRow {
    borrower_reference: Uuid,
    book_reference: Uuid,
    borrow_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Attach loan histories to borrower rows, in insertion order
    async fn with_entries(&self, rows: Vec<BorrowerRow>) -> AppResult<Vec<Borrower>> {
        let references: Vec<Uuid> = rows.iter().map(|r| r.borrower_reference).collect();

        let entries = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT borrower_reference, book_reference, borrow_date, return_date
            FROM books_borrowed
            WHERE borrower_reference = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&references)
        .fetch_all(&self.pool)
        .await?;

        let mut by_borrower: HashMap<Uuid, Vec<BookBorrowed>> = HashMap::new();
        for entry in entries {
            by_borrower
                .entry(entry.borrower_reference)
                .or_default()
                .push(BookBorrowed {
                    book_reference: entry.book_reference,
                    borrow_date: entry.borrow_date,
                    return_date: entry.return_date,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let entries = by_borrower.remove(&row.borrower_reference).unwrap_or_default();
                row.with_entries(entries)
            })
            .collect())
    }

    /// List borrowers with soft-delete filter and pagination
    pub async fn list(
        &self,
        filter: RecordFilter,
        page: &PageQuery,
    ) -> AppResult<(Vec<Borrower>, i64)> {
        let where_clause = filter
            .condition()
            .map(|c| format!("WHERE {}", c))
            .unwrap_or_default();

        let count_q = format!("SELECT COUNT(*) FROM borrowers {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_q).fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM borrowers {} ORDER BY last_name, first_name LIMIT {} OFFSET {}",
            where_clause,
            page.limit(),
            page.offset()
        );
        let rows = sqlx::query_as::<_, BorrowerRow>(&select_q)
            .fetch_all(&self.pool)
            .await?;

        Ok((self.with_entries(rows).await?, total))
    }

    /// Case-insensitive search on first or last name
    pub async fn search_by_name(
        &self,
        name: &str,
        page: &PageQuery,
    ) -> AppResult<(Vec<Borrower>, i64)> {
        let pattern = format!("%{}%", name);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowers WHERE first_name ILIKE $1 OR last_name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BorrowerRow>(
            r#"
            SELECT * FROM borrowers
            WHERE first_name ILIKE $1 OR last_name ILIKE $1
            ORDER BY last_name, first_name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.with_entries(rows).await?, total))
    }

    pub async fn name_exists(&self, first_name: &str, last_name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowers WHERE first_name = $1 AND last_name = $2)",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let row = sqlx::query_as::<_, BorrowerRow>(
            r#"
            INSERT INTO borrowers (
                borrower_reference, first_name, last_name, date_of_birth,
                email, phone, created_at, updated_at, is_deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(borrower.borrower_reference)
        .bind(&borrower.first_name)
        .bind(&borrower.last_name)
        .bind(borrower.date_of_birth)
        .bind(&borrower.email)
        .bind(&borrower.phone)
        .bind(borrower.created_at)
        .bind(borrower.updated_at)
        .bind(borrower.is_deleted)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.with_entries(Vec::new()))
    }

    /// Update profile fields; the loan history is only touched through the port
    pub async fn update(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let row = sqlx::query_as::<_, BorrowerRow>(
            r#"
            UPDATE borrowers SET
                first_name = $2, last_name = $3, date_of_birth = $4,
                email = $5, phone = $6, updated_at = NOW()
            WHERE borrower_reference = $1
            RETURNING *
            "#,
        )
        .bind(borrower.borrower_reference)
        .bind(&borrower.first_name)
        .bind(&borrower.last_name)
        .bind(borrower.date_of_birth)
        .bind(&borrower.email)
        .bind(&borrower.phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Borrower {} not found", borrower.borrower_reference))
        })?;

        self.with_entries(vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(borrower.borrower_reference))
    }

    pub async fn delete(&self, borrower_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM borrowers WHERE borrower_reference = $1")
            .bind(borrower_reference)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(borrower_reference));
        }
        Ok(())
    }

    pub async fn soft_delete(&self, borrower_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE borrowers SET is_deleted = TRUE, updated_at = NOW() WHERE borrower_reference = $1",
        )
        .bind(borrower_reference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(borrower_reference));
        }
        Ok(())
    }

    /// Append a loan entry. The borrower row stays locked until commit, so
    /// concurrent appends for one borrower run one after the other and the
    /// exclusive check sees entries committed before it.
    async fn insert_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
        exclusive: bool,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            "UPDATE borrowers SET updated_at = NOW() WHERE borrower_reference = $1",
        )
        .bind(borrower_reference)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(not_found(borrower_reference));
        }

        if exclusive {
            let already_open: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM books_borrowed
                    WHERE borrower_reference = $1 AND book_reference = $2 AND return_date IS NULL
                )
                "#,
            )
            .bind(borrower_reference)
            .bind(entry.book_reference)
            .fetch_one(&mut *tx)
            .await?;

            if already_open {
                return Err(AppError::ForbiddenOperation(format!(
                    "Borrower {} already has an open loan of book {}",
                    borrower_reference, entry.book_reference
                )));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO books_borrowed (borrower_reference, book_reference, borrow_date, return_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(borrower_reference)
        .bind(entry.book_reference)
        .bind(entry.borrow_date)
        .bind(entry.return_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn touch(&self, borrower_reference: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE borrowers SET updated_at = NOW() WHERE borrower_reference = $1")
            .bind(borrower_reference)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn not_found(borrower_reference: Uuid) -> AppError {
    AppError::NotFound(format!("Borrower {} not found", borrower_reference))
}

#[async_trait]
impl BorrowerRecords for BorrowersRepository {
    async fn get_by_reference(&self, borrower_reference: Uuid) -> AppResult<Borrower> {
        let row = sqlx::query_as::<_, BorrowerRow>(
            "SELECT * FROM borrowers WHERE borrower_reference = $1",
        )
        .bind(borrower_reference)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(borrower_reference))?;

        self.with_entries(vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(borrower_reference))
    }

    async fn add_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        self.insert_entry(borrower_reference, entry, false).await
    }

    async fn add_exclusive_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        self.insert_entry(borrower_reference, entry, true).await
    }

    async fn close_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        book_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> AppResult<BookBorrowed> {
        let closed = sqlx::query_as::<_, BookBorrowed>(
            r#"
            UPDATE books_borrowed SET return_date = $3
            WHERE id = (
                SELECT id FROM books_borrowed
                WHERE borrower_reference = $1 AND book_reference = $2 AND return_date IS NULL
                ORDER BY id
                LIMIT 1
                FOR UPDATE
            )
            RETURNING book_reference, borrow_date, return_date
            "#,
        )
        .bind(borrower_reference)
        .bind(book_reference)
        .bind(return_date)
        .fetch_optional(&self.pool)
        .await?;

        match closed {
            Some(entry) => {
                self.touch(borrower_reference).await?;
                Ok(entry)
            }
            None => {
                // Missing borrower wins over a missing open entry
                self.get_by_reference(borrower_reference).await?;
                Err(AppError::ForbiddenOperation(format!(
                    "Borrower {} has no open loan of book {}",
                    borrower_reference, book_reference
                )))
            }
        }
    }

    async fn remove_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM books_borrowed
            WHERE id = (
                SELECT id FROM books_borrowed
                WHERE borrower_reference = $1 AND book_reference = $2
                  AND borrow_date = $3 AND return_date IS NULL
                ORDER BY id DESC
                LIMIT 1
            )
            "#,
        )
        .bind(borrower_reference)
        .bind(entry.book_reference)
        .bind(entry.borrow_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No open loan of book {} for borrower {}",
                entry.book_reference, borrower_reference
            )));
        }
        self.touch(borrower_reference).await
    }

    async fn reopen_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books_borrowed SET return_date = NULL
            WHERE id = (
                SELECT id FROM books_borrowed
                WHERE borrower_reference = $1 AND book_reference = $2
                  AND borrow_date = $3 AND return_date = $4
                ORDER BY id
                LIMIT 1
            )
            "#,
        )
        .bind(borrower_reference)
        .bind(entry.book_reference)
        .bind(entry.borrow_date)
        .bind(entry.return_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No closed loan of book {} for borrower {}",
                entry.book_reference, borrower_reference
            )));
        }
        self.touch(borrower_reference).await
    }
}
