//! Authors repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Author, PageQuery},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, page: &PageQuery) -> AppResult<(Vec<Author>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE is_deleted = FALSE")
            .fetch_one(&self.pool)
            .await?;

        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT * FROM authors WHERE is_deleted = FALSE
            ORDER BY last_name, first_name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((authors, total))
    }

    pub async fn get_by_reference(&self, author_reference: Uuid) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE author_reference = $1")
            .bind(author_reference)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", author_reference)))
    }

    pub async fn name_exists(&self, first_name: &str, last_name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE first_name = $1 AND last_name = $2)",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, author: &Author) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (
                author_reference, first_name, last_name, date_of_birth, nationality,
                biography, email, phone, awards, created_at, updated_at, is_deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(author.author_reference)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.date_of_birth)
        .bind(&author.nationality)
        .bind(&author.biography)
        .bind(&author.email)
        .bind(&author.phone)
        .bind(&author.awards)
        .bind(author.created_at)
        .bind(author.updated_at)
        .bind(author.is_deleted)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(&self, author: &Author) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                first_name = $2, last_name = $3, date_of_birth = $4, nationality = $5,
                biography = $6, email = $7, phone = $8, awards = $9, updated_at = NOW()
            WHERE author_reference = $1
            RETURNING *
            "#,
        )
        .bind(author.author_reference)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.date_of_birth)
        .bind(&author.nationality)
        .bind(&author.biography)
        .bind(&author.email)
        .bind(&author.phone)
        .bind(&author.awards)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Author {} not found", author.author_reference))
        })
    }

    pub async fn delete(&self, author_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE author_reference = $1")
            .bind(author_reference)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", author_reference)));
        }
        Ok(())
    }

    pub async fn soft_delete(&self, author_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE authors SET is_deleted = TRUE, updated_at = NOW() WHERE author_reference = $1",
        )
        .bind(author_reference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", author_reference)));
        }
        Ok(())
    }
}
