//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, PageQuery, RecordFilter},
};

use super::ports::BookAvailability;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books with soft-delete filter and pagination
    pub async fn list(&self, filter: RecordFilter, page: &PageQuery) -> AppResult<(Vec<Book>, i64)> {
        let where_clause = filter
            .condition()
            .map(|c| format!("WHERE {}", c))
            .unwrap_or_default();

        let count_q = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_q).fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM books {} ORDER BY title LIMIT {} OFFSET {}",
            where_clause,
            page.limit(),
            page.offset()
        );
        let books = sqlx::query_as::<_, Book>(&select_q)
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Non-deleted books written by an author
    pub async fn list_by_author(
        &self,
        author_reference: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.list_by_reference_column("author_references", author_reference, page)
            .await
    }

    /// Non-deleted books filed under a genre
    pub async fn list_by_genre(
        &self,
        genre_reference: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        self.list_by_reference_column("genre_references", genre_reference, page)
            .await
    }

    async fn list_by_reference_column(
        &self,
        column: &'static str,
        reference: Uuid,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        let condition = format!("$1 = ANY({}) AND is_deleted = FALSE", column);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", condition))
            .bind(reference)
            .fetch_one(&self.pool)
            .await?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM books WHERE {} ORDER BY title LIMIT $2 OFFSET $3",
            condition
        ))
        .bind(reference)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Find a book by exact title
    pub async fn find_by_title(&self, title: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub async fn create(&self, book: &Book) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                book_reference, title, isbn, author_references, genre_references,
                publication_date, language, synopsis, page_count, publisher,
                available_copies, total_copies, created_at, updated_at, is_deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(book.book_reference)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.author_references)
        .bind(&book.genre_references)
        .bind(book.publication_date)
        .bind(&book.language)
        .bind(&book.synopsis)
        .bind(book.page_count)
        .bind(&book.publisher)
        .bind(book.available_copies)
        .bind(book.total_copies)
        .bind(book.created_at)
        .bind(book.updated_at)
        .bind(book.is_deleted)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Write back catalog fields. Copy counts are guarded against loans
    /// taken since the book was read.
    pub async fn update(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $2, isbn = $3, author_references = $4, genre_references = $5,
                publication_date = $6, language = $7, synopsis = $8, page_count = $9,
                publisher = $10,
                available_copies = available_copies + ($11 - total_copies),
                total_copies = $11,
                updated_at = NOW()
            WHERE book_reference = $1
              AND available_copies + ($11 - total_copies) >= 0
            RETURNING *
            "#,
        )
        .bind(book.book_reference)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.author_references)
        .bind(&book.genre_references)
        .bind(book.publication_date)
        .bind(&book.language)
        .bind(&book.synopsis)
        .bind(book.page_count)
        .bind(&book.publisher)
        .bind(book.total_copies)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Book {} changed while updating, copies on loan exceed total",
                book.book_reference
            ))
        })
    }

    pub async fn delete(&self, book_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE book_reference = $1")
            .bind(book_reference)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", book_reference)));
        }
        Ok(())
    }

    pub async fn soft_delete(&self, book_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET is_deleted = TRUE, updated_at = NOW() WHERE book_reference = $1",
        )
        .bind(book_reference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", book_reference)));
        }
        Ok(())
    }

    /// Tell a missing book from a guard rejection after a conditional update
    async fn guard_failure(&self, book_reference: Uuid, message: String) -> AppError {
        match self.get_by_reference(book_reference).await {
            Ok(_) => AppError::ForbiddenOperation(message),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl BookAvailability for BooksRepository {
    async fn get_by_reference(&self, book_reference: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE book_reference = $1")
            .bind(book_reference)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_reference)))
    }

    async fn increase_available_copies(&self, book_reference: Uuid) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE book_reference = $1 AND available_copies < total_copies
            RETURNING *
            "#,
        )
        .bind(book_reference)
        .fetch_optional(&self.pool)
        .await?;

        match book {
            Some(book) => Ok(book),
            None => Err(self
                .guard_failure(
                    book_reference,
                    format!("All copies of book {} are already available", book_reference),
                )
                .await),
        }
    }

    async fn decrease_available_copies(&self, book_reference: Uuid) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE book_reference = $1 AND available_copies > 0
            RETURNING *
            "#,
        )
        .bind(book_reference)
        .fetch_optional(&self.pool)
        .await?;

        match book {
            Some(book) => Ok(book),
            None => Err(self
                .guard_failure(
                    book_reference,
                    format!("No available copies to borrow for book {}", book_reference),
                )
                .await),
        }
    }
}
