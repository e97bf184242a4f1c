//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod transactions;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub transactions: transactions::TransactionsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let transactions = transactions::TransactionsService::new(
            Arc::new(repository.books.clone()),
            Arc::new(repository.borrowers.clone()),
            Arc::new(repository.transactions.clone()),
            config.loans.clone(),
        );

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            transactions,
            users: users::UsersService::new(repository, config.auth.clone()),
        }
    }
}
