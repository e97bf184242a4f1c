//! LMS Server: library record service
//!
//! Tracks books, authors, genres, borrowers and borrow/return transactions
//! behind a REST JSON API. The borrow/return workflow lives in
//! [`services::transactions`] and talks to storage only through the ports in
//! [`repository::ports`].

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
