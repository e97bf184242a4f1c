//! Genres repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Genre, PageQuery},
};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, page: &PageQuery) -> AppResult<(Vec<Genre>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;

        let genres = sqlx::query_as::<_, Genre>(
            "SELECT * FROM genres ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((genres, total))
    }

    pub async fn get_by_reference(&self, genre_reference: Uuid) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE genre_reference = $1")
            .bind(genre_reference)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", genre_reference)))
    }

    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM genres WHERE LOWER(name) = LOWER($1))")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn create(&self, genre: &Genre) -> AppResult<Genre> {
        let created = sqlx::query_as::<_, Genre>(
            r#"
            INSERT INTO genres (genre_reference, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(genre.genre_reference)
        .bind(&genre.name)
        .bind(&genre.description)
        .bind(genre.created_at)
        .bind(genre.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(&self, genre: &Genre) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            r#"
            UPDATE genres SET name = $2, description = $3, updated_at = NOW()
            WHERE genre_reference = $1
            RETURNING *
            "#,
        )
        .bind(genre.genre_reference)
        .bind(&genre.name)
        .bind(&genre.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", genre.genre_reference)))
    }

    pub async fn delete(&self, genre_reference: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM genres WHERE genre_reference = $1")
            .bind(genre_reference)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", genre_reference)));
        }
        Ok(())
    }
}
