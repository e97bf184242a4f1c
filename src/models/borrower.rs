//! Borrower model and borrowed-list bookkeeping

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// One loan of a book, embedded in the borrower's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookBorrowed {
    pub book_reference: Uuid,
    pub borrow_date: DateTime<Utc>,
    /// Absent while the loan is open
    pub return_date: Option<DateTime<Utc>>,
}

impl BookBorrowed {
    pub fn open(book_reference: Uuid, borrow_date: DateTime<Utc>) -> Self {
        Self {
            book_reference,
            borrow_date,
            return_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Borrower record with its loan history in insertion order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Borrower {
    pub borrower_reference: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: Option<String>,
    pub books_borrowed: Vec<BookBorrowed>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Borrower row from database (loan history lives in `books_borrowed`)
#[derive(Debug, Clone, FromRow)]
pub struct BorrowerRow {
    pub borrower_reference: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl BorrowerRow {
    pub fn with_entries(self, books_borrowed: Vec<BookBorrowed>) -> Borrower {
        Borrower {
            borrower_reference: self.borrower_reference,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            email: self.email,
            phone: self.phone,
            books_borrowed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_deleted: self.is_deleted,
        }
    }
}

impl Borrower {
    pub fn new(data: CreateBorrower) -> Self {
        let now = Utc::now();
        Self {
            borrower_reference: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            date_of_birth: data.date_of_birth,
            email: data.email,
            phone: data.phone,
            books_borrowed: Vec::new(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    /// Whether an unreturned loan of this book exists
    pub fn has_open_loan(&self, book_reference: Uuid) -> bool {
        self.books_borrowed
            .iter()
            .any(|entry| entry.book_reference == book_reference && entry.is_open())
    }

    pub fn open_loans(&self) -> impl Iterator<Item = &BookBorrowed> {
        self.books_borrowed.iter().filter(|entry| entry.is_open())
    }

    /// Append a loan entry
    pub fn borrow_book(&mut self, entry: BookBorrowed) {
        self.books_borrowed.push(entry);
        self.updated_at = Utc::now();
    }

    /// Append a loan entry unless one for the same book is still open
    pub fn borrow_book_exclusive(&mut self, entry: BookBorrowed) -> AppResult<()> {
        if self.has_open_loan(entry.book_reference) {
            return Err(AppError::ForbiddenOperation(format!(
                "Borrower {} already has an open loan of book {}",
                self.borrower_reference, entry.book_reference
            )));
        }
        self.borrow_book(entry);
        Ok(())
    }

    /// Close the earliest open loan of the book and return the closed entry
    pub fn return_book(
        &mut self,
        book_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> AppResult<BookBorrowed> {
        let entry = self
            .books_borrowed
            .iter_mut()
            .find(|entry| entry.book_reference == book_reference && entry.is_open())
            .ok_or_else(|| {
                AppError::ForbiddenOperation(format!(
                    "Borrower {} has no open loan of book {}",
                    self.borrower_reference, book_reference
                ))
            })?;

        entry.return_date = Some(return_date);
        let closed = entry.clone();
        self.updated_at = Utc::now();
        Ok(closed)
    }

    /// Drop the most recent open entry equal to `entry`
    pub fn remove_entry(&mut self, entry: &BookBorrowed) -> bool {
        match self.books_borrowed.iter().rposition(|e| e == entry && e.is_open()) {
            Some(position) => {
                self.books_borrowed.remove(position);
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Clear the return date of a previously closed entry
    pub fn reopen_entry(&mut self, closed: &BookBorrowed) -> bool {
        let found = self.books_borrowed.iter_mut().find(|e| {
            e.book_reference == closed.book_reference
                && e.borrow_date == closed.borrow_date
                && e.return_date.is_some()
                && e.return_date == closed.return_date
        });

        match found {
            Some(entry) => {
                entry.return_date = None;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, data: UpdateBorrower) {
        if let Some(first_name) = data.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            self.last_name = last_name;
        }
        if data.date_of_birth.is_some() {
            self.date_of_birth = data.date_of_birth;
        }
        if let Some(email) = data.email {
            self.email = email;
        }
        if data.phone.is_some() {
            self.phone = data.phone;
        }
        self.updated_at = Utc::now();
    }
}

/// Create borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
}

/// Update borrower request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBorrower {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(email(message = "Valid email is required"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}
