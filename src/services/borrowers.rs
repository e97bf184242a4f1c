//! Borrower management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrower::{CreateBorrower, UpdateBorrower},
        BookTransaction, Borrower, PageQuery, RecordFilter,
    },
    repository::{BorrowerRecords, Repository},
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List borrowers, or search them by name when `name` is given
    pub async fn list(
        &self,
        name: Option<&str>,
        filter: RecordFilter,
        page: &PageQuery,
    ) -> AppResult<(Vec<Borrower>, i64)> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.repository.borrowers.search_by_name(name, page).await,
            None => self.repository.borrowers.list(filter, page).await,
        }
    }

    pub async fn get(&self, borrower_reference: Uuid) -> AppResult<Borrower> {
        self.repository
            .borrowers
            .get_by_reference(borrower_reference)
            .await
    }

    /// Transactions of a borrower, most recent first
    pub async fn transactions(&self, borrower_reference: Uuid) -> AppResult<Vec<BookTransaction>> {
        self.get(borrower_reference).await?;
        self.repository
            .transactions
            .list_for_borrower(borrower_reference)
            .await
    }

    pub async fn create(&self, data: CreateBorrower) -> AppResult<Borrower> {
        if self
            .repository
            .borrowers
            .name_exists(&data.first_name, &data.last_name)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Borrower {} {} already exists",
                data.first_name, data.last_name
            )));
        }

        let created = self.repository.borrowers.create(&Borrower::new(data)).await?;
        tracing::info!("Borrower {} created", created.borrower_reference);
        Ok(created)
    }

    pub async fn update(&self, borrower_reference: Uuid, data: UpdateBorrower) -> AppResult<Borrower> {
        let mut borrower = self.get(borrower_reference).await?;
        borrower.apply(data);
        self.repository.borrowers.update(&borrower).await
    }

    pub async fn delete(&self, borrower_reference: Uuid) -> AppResult<()> {
        let borrower = self.get(borrower_reference).await?;
        if borrower.open_loans().next().is_some() {
            return Err(AppError::Conflict(format!(
                "Borrower {} still has books on loan",
                borrower_reference
            )));
        }
        self.repository.borrowers.delete(borrower_reference).await
    }

    pub async fn soft_delete(&self, borrower_reference: Uuid) -> AppResult<()> {
        self.repository.borrowers.soft_delete(borrower_reference).await
    }
}
