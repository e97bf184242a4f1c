//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod borrowers;
pub mod genres;
pub mod memory;
pub mod ports;
pub mod transactions;
pub mod users;

use sqlx::{Pool, Postgres};

pub use memory::MemoryStore;
pub use ports::{BookAvailability, BorrowerRecords, TransactionStore};

/// Main repository struct holding the per-table repositories
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub authors: authors::AuthorsRepository,
    pub genres: genres::GenresRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub transactions: transactions::TransactionsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            borrowers: borrowers::BorrowersRepository::new(pool.clone()),
            transactions: transactions::TransactionsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool),
        }
    }
}
