//! Data models for the LMS server

pub mod author;
pub mod book;
pub mod borrower;
pub mod genre;
pub mod transaction;
pub mod user;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use borrower::{BookBorrowed, Borrower};
pub use genre::Genre;
pub use transaction::{BookTransaction, CreateBookTransaction, TransactionStatus};
pub use user::{User, UserClaims};

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

/// Soft-delete filter for record listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordFilter {
    #[default]
    All,
    Deleted,
    NotDeleted,
}

impl RecordFilter {
    /// SQL condition on `is_deleted`, if any
    pub fn condition(&self) -> Option<&'static str> {
        match self {
            RecordFilter::All => None,
            RecordFilter::Deleted => Some("is_deleted = TRUE"),
            RecordFilter::NotDeleted => Some("is_deleted = FALSE"),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page (max 100)
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

/// Listing query with soft-delete filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// all, deleted or not_deleted
    pub filter: Option<RecordFilter>,
}

impl ListQuery {
    pub fn paging(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
