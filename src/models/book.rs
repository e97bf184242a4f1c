//! Book model and copy-count bookkeeping

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub book_reference: Uuid,
    pub title: String,
    pub isbn: String,
    pub author_references: Vec<Uuid>,
    pub genre_references: Vec<Uuid>,
    pub publication_date: Option<NaiveDate>,
    pub language: String,
    pub synopsis: Option<String>,
    pub page_count: i32,
    pub publisher: Option<String>,
    /// Copies currently on the shelf
    pub available_copies: i32,
    /// Copies owned by the library, never lower than `available_copies`
    pub total_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Book {
    /// Build a new book; all copies start on the shelf unless told otherwise
    pub fn new(data: CreateBook) -> AppResult<Self> {
        let available_copies = data.available_copies.unwrap_or(data.total_copies);
        if available_copies > data.total_copies {
            return Err(AppError::Validation(format!(
                "Available copies ({}) cannot exceed total copies ({})",
                available_copies, data.total_copies
            )));
        }

        let now = Utc::now();
        Ok(Self {
            book_reference: Uuid::new_v4(),
            title: data.title,
            isbn: data.isbn,
            author_references: data.author_references,
            genre_references: data.genre_references,
            publication_date: data.publication_date,
            language: data.language,
            synopsis: data.synopsis,
            page_count: data.page_count,
            publisher: data.publisher,
            available_copies,
            total_copies: data.total_copies,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        })
    }

    pub fn has_available_copy(&self) -> bool {
        self.available_copies >= 1
    }

    /// Take one copy off the shelf
    pub fn decrease_available_copies(&mut self) -> AppResult<()> {
        if self.available_copies <= 0 {
            return Err(AppError::ForbiddenOperation(format!(
                "No available copies to borrow for book {}",
                self.book_reference
            )));
        }
        self.available_copies -= 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Put one copy back on the shelf
    pub fn increase_available_copies(&mut self) -> AppResult<()> {
        if self.available_copies >= self.total_copies {
            return Err(AppError::ForbiddenOperation(format!(
                "All {} copies of book {} are already available",
                self.total_copies, self.book_reference
            )));
        }
        self.available_copies += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Change the owned copy count, keeping copies on loan accounted for
    pub fn set_total_copies(&mut self, total_copies: i32) -> AppResult<()> {
        let on_loan = self.total_copies - self.available_copies;
        if total_copies < 1 || total_copies < on_loan {
            return Err(AppError::Validation(format!(
                "Total copies must be at least 1 and at least the {} copies on loan",
                on_loan
            )));
        }
        self.total_copies = total_copies;
        self.available_copies = total_copies - on_loan;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply an update request; references are resolved by the caller
    pub fn apply(&mut self, data: UpdateBook) -> AppResult<()> {
        if let Some(total_copies) = data.total_copies {
            self.set_total_copies(total_copies)?;
        }
        if let Some(title) = data.title {
            self.title = title;
        }
        if let Some(isbn) = data.isbn {
            self.isbn = isbn;
        }
        if let Some(author_references) = data.author_references {
            self.author_references = author_references;
        }
        if let Some(genre_references) = data.genre_references {
            self.genre_references = genre_references;
        }
        if data.publication_date.is_some() {
            self.publication_date = data.publication_date;
        }
        if let Some(language) = data.language {
            self.language = language;
        }
        if data.synopsis.is_some() {
            self.synopsis = data.synopsis;
        }
        if let Some(page_count) = data.page_count {
            self.page_count = page_count;
        }
        if data.publisher.is_some() {
            self.publisher = data.publisher;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "At least one author is required"))]
    pub author_references: Vec<Uuid>,
    #[validate(length(min = 1, message = "At least one genre is required"))]
    pub genre_references: Vec<Uuid>,
    pub publication_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Language is required"))]
    pub language: String,
    pub synopsis: Option<String>,
    #[validate(range(min = 1, message = "Page count must be a positive integer"))]
    pub page_count: i32,
    pub publisher: Option<String>,
    #[validate(range(min = 0, message = "Available copies must be a non-negative integer"))]
    pub available_copies: Option<i32>,
    #[validate(range(min = 1, message = "Total copies must be a positive integer"))]
    pub total_copies: i32,
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub isbn: Option<String>,
    #[validate(length(min = 1))]
    pub author_references: Option<Vec<Uuid>>,
    #[validate(length(min = 1))]
    pub genre_references: Option<Vec<Uuid>>,
    pub publication_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub synopsis: Option<String>,
    #[validate(range(min = 1))]
    pub page_count: Option<i32>,
    pub publisher: Option<String>,
    #[validate(range(min = 1))]
    pub total_copies: Option<i32>,
}

#[cfg(test)]
pub(crate) fn sample_create(total_copies: i32, available_copies: Option<i32>) -> CreateBook {
    CreateBook {
        title: "The Left Hand of Darkness".to_string(),
        isbn: "978-0441478125".to_string(),
        author_references: vec![Uuid::new_v4()],
        genre_references: vec![Uuid::new_v4()],
        publication_date: NaiveDate::from_ymd_opt(1969, 3, 1),
        language: "en".to_string(),
        synopsis: None,
        page_count: 304,
        publisher: Some("Ace".to_string()),
        available_copies,
        total_copies,
    }
}

#[cfg(test)]
pub(crate) fn sample_book(total_copies: i32, available_copies: i32) -> Book {
    Book::new(sample_create(total_copies, Some(available_copies))).expect("valid sample book")
}
