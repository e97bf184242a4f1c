//! Borrow/return workflow tests against the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use lms_server::{
    config::LoanPolicy,
    error::AppError,
    models::{
        book::CreateBook,
        borrower::CreateBorrower,
        transaction::CreateBookTransaction,
        Book, BookBorrowed, BookTransaction, Borrower, TransactionStatus,
    },
    repository::{BookAvailability, BorrowerRecords, MemoryStore, TransactionStore},
    services::transactions::TransactionsService,
};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn book(total_copies: i32, available_copies: i32) -> Book {
    Book::new(CreateBook {
        title: "A Wizard of Earthsea".to_string(),
        isbn: "978-0547773742".to_string(),
        author_references: vec![Uuid::new_v4()],
        genre_references: vec![Uuid::new_v4()],
        publication_date: NaiveDate::from_ymd_opt(1968, 11, 1),
        language: "en".to_string(),
        synopsis: None,
        page_count: 183,
        publisher: Some("Parnassus".to_string()),
        available_copies: Some(available_copies),
        total_copies,
    })
    .unwrap()
}

fn borrower(last_name: &str) -> Borrower {
    Borrower::new(CreateBorrower {
        first_name: "Ged".to_string(),
        last_name: last_name.to_string(),
        date_of_birth: None,
        email: format!("{}@example.org", last_name.to_lowercase()),
        phone: None,
    })
}

/// Borrower records that hand control back to the scheduler after each read,
/// so two workflows interleave between their checks and their writes
struct YieldingBorrowers(Arc<MemoryStore>);

#[async_trait]
impl BorrowerRecords for YieldingBorrowers {
    async fn get_by_reference(&self, borrower_reference: Uuid) -> Result<Borrower, AppError> {
        let borrower = BorrowerRecords::get_by_reference(self.0.as_ref(), borrower_reference).await;
        tokio::task::yield_now().await;
        borrower
    }

    async fn add_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> Result<(), AppError> {
        self.0.add_borrowed_entry(borrower_reference, entry).await
    }

    async fn add_exclusive_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> Result<(), AppError> {
        self.0.add_exclusive_borrowed_entry(borrower_reference, entry).await
    }

    async fn close_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        book_reference: Uuid,
        return_date: DateTime<Utc>,
    ) -> Result<BookBorrowed, AppError> {
        self.0
            .close_borrowed_entry(borrower_reference, book_reference, return_date)
            .await
    }

    async fn remove_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> Result<(), AppError> {
        self.0.remove_borrowed_entry(borrower_reference, entry).await
    }

    async fn reopen_borrowed_entry(
        &self,
        borrower_reference: Uuid,
        entry: BookBorrowed,
    ) -> Result<(), AppError> {
        self.0.reopen_borrowed_entry(borrower_reference, entry).await
    }
}

/// Transaction store that yields after each read
struct YieldingTransactions(Arc<MemoryStore>);

#[async_trait]
impl TransactionStore for YieldingTransactions {
    async fn create(&self, transaction: BookTransaction) -> Result<BookTransaction, AppError> {
        self.0.create(transaction).await
    }

    async fn update(
        &self,
        transaction_reference: Uuid,
        transaction: BookTransaction,
    ) -> Result<BookTransaction, AppError> {
        self.0.update(transaction_reference, transaction).await
    }

    async fn get_by_reference(
        &self,
        transaction_reference: Uuid,
    ) -> Result<BookTransaction, AppError> {
        let transaction =
            TransactionStore::get_by_reference(self.0.as_ref(), transaction_reference).await;
        tokio::task::yield_now().await;
        transaction
    }
}

struct Library {
    store: Arc<MemoryStore>,
    service: TransactionsService,
}

impl Library {
    fn new() -> Self {
        Self::with_policy(LoanPolicy::default())
    }

    fn with_policy(policy: LoanPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let service = TransactionsService::new(store.clone(), store.clone(), store.clone(), policy);
        Self { store, service }
    }

    async fn add_book(&self, total_copies: i32, available_copies: i32) -> Uuid {
        let book = book(total_copies, available_copies);
        let reference = book.book_reference;
        self.store.insert_book(book).await;
        reference
    }

    async fn add_borrower(&self, last_name: &str) -> Uuid {
        let borrower = borrower(last_name);
        let reference = borrower.borrower_reference;
        self.store.insert_borrower(borrower).await;
        reference
    }

    async fn available(&self, book_reference: Uuid) -> i32 {
        BookAvailability::get_by_reference(self.store.as_ref(), book_reference)
            .await
            .unwrap()
            .available_copies
    }

    async fn borrower(&self, borrower_reference: Uuid) -> Borrower {
        BorrowerRecords::get_by_reference(self.store.as_ref(), borrower_reference)
            .await
            .unwrap()
    }

    async fn borrow(
        &self,
        book_reference: Uuid,
        borrower_reference: Uuid,
        date: DateTime<Utc>,
    ) -> Result<BookTransaction, AppError> {
        self.service
            .borrow_book(CreateBookTransaction {
                book_reference,
                borrower_reference,
                transaction_date: date,
            })
            .await
    }
}

#[tokio::test]
async fn test_borrow_and_return_scenario() {
    let library = Library::new();
    let book = library.add_book(2, 2).await;
    let borrower = library.add_borrower("Sparrowhawk").await;

    let transaction = assert_ok!(library.borrow(book, borrower, day(1)).await);
    assert_eq!(transaction.status, TransactionStatus::Borrowed);
    assert_eq!(transaction.transaction_date, day(1));
    assert!(transaction.return_date.is_none());
    assert_eq!(library.available(book).await, 1);

    let record = library.borrower(borrower).await;
    assert_eq!(record.books_borrowed.len(), 1);
    assert_eq!(record.books_borrowed[0].book_reference, book);
    assert!(record.books_borrowed[0].is_open());

    let returned = assert_ok!(
        library
            .service
            .return_book(transaction.transaction_reference, day(10))
            .await
    );
    assert_eq!(returned.status, TransactionStatus::Returned);
    assert_eq!(returned.return_date, Some(day(10)));
    assert_eq!(library.available(book).await, 2);

    let record = library.borrower(borrower).await;
    assert_eq!(record.books_borrowed.len(), 1);
    assert_eq!(record.books_borrowed[0].return_date, Some(day(10)));

    let stored = assert_ok!(
        TransactionStore::get_by_reference(library.store.as_ref(), transaction.transaction_reference)
            .await
    );
    assert_eq!(stored, returned);
}

#[tokio::test]
async fn test_single_copy_round_trip_restores_copy() {
    let library = Library::new();
    let book = library.add_book(1, 1).await;
    let borrower = library.add_borrower("Ogion").await;

    let transaction = assert_ok!(library.borrow(book, borrower, day(2)).await);
    assert_eq!(library.available(book).await, 0);

    assert_ok!(
        library
            .service
            .return_book(transaction.transaction_reference, day(3))
            .await
    );
    assert_eq!(library.available(book).await, 1);

    let record = library.borrower(borrower).await;
    assert_eq!(record.books_borrowed.len(), 1);
    assert_eq!(record.open_loans().count(), 0);
}

#[tokio::test]
async fn test_borrow_without_copies_mutates_nothing() {
    let library = Library::new();
    let book = library.add_book(1, 0).await;
    let borrower = library.add_borrower("Vetch").await;

    let result = library.borrow(book, borrower, day(1)).await;
    assert!(matches!(result, Err(AppError::BookUnavailable(_))));

    assert_eq!(library.available(book).await, 0);
    assert!(library.borrower(borrower).await.books_borrowed.is_empty());
    assert!(library.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_borrow_unknown_book_or_borrower() {
    let library = Library::new();
    let book = library.add_book(1, 1).await;
    let borrower = library.add_borrower("Jasper").await;

    let result = library.borrow(Uuid::new_v4(), borrower, day(1)).await;
    assert!(matches!(result, Err(AppError::BookUnavailable(_))));

    let result = library.borrow(book, Uuid::new_v4(), day(1)).await;
    assert!(matches!(result, Err(AppError::BorrowerNotFound(_))));

    assert_eq!(library.available(book).await, 1);
    assert!(library.store.transactions().await.is_empty());
}

#[tokio::test]
async fn test_borrow_deleted_book_is_unavailable() {
    let library = Library::new();
    let mut deleted = book(2, 2);
    deleted.soft_delete();
    let reference = deleted.book_reference;
    library.store.insert_book(deleted).await;
    let borrower = library.add_borrower("Serret").await;

    let result = library.borrow(reference, borrower, day(1)).await;
    assert!(matches!(result, Err(AppError::BookUnavailable(_))));
    assert_eq!(library.available(reference).await, 2);
}

#[tokio::test]
async fn test_second_open_loan_of_same_book_is_rejected() {
    let library = Library::new();
    let book = library.add_book(3, 3).await;
    let borrower = library.add_borrower("Tenar").await;

    assert_ok!(library.borrow(book, borrower, day(1)).await);
    let result = library.borrow(book, borrower, day(2)).await;

    assert!(matches!(result, Err(AppError::DuplicateOpenLoan(_))));
    assert_eq!(library.available(book).await, 2);
    assert_eq!(library.borrower(borrower).await.books_borrowed.len(), 1);
    assert_eq!(library.store.transactions().await.len(), 1);
}

#[tokio::test]
async fn test_duplicate_loans_close_in_borrow_order() {
    let library = Library::with_policy(LoanPolicy {
        allow_duplicate_open_loans: true,
    });
    let book = library.add_book(3, 3).await;
    let borrower = library.add_borrower("Tenar").await;

    let first = assert_ok!(library.borrow(book, borrower, day(1)).await);
    assert_ok!(library.borrow(book, borrower, day(2)).await);
    assert_eq!(library.available(book).await, 1);

    assert_ok!(
        library
            .service
            .return_book(first.transaction_reference, day(5))
            .await
    );

    let record = library.borrower(borrower).await;
    assert_eq!(record.books_borrowed.len(), 2);
    assert_eq!(record.books_borrowed[0].return_date, Some(day(5)));
    assert!(record.books_borrowed[1].is_open());
    assert_eq!(library.available(book).await, 2);
}

#[tokio::test]
async fn test_return_unknown_transaction_mutates_nothing() {
    let library = Library::new();
    let book = library.add_book(1, 1).await;
    let borrower = library.add_borrower("Arren").await;
    assert_ok!(library.borrow(book, borrower, day(1)).await);

    let result = library.service.return_book(Uuid::new_v4(), day(2)).await;
    assert!(matches!(result, Err(AppError::TransactionNotFound(_))));

    assert_eq!(library.available(book).await, 0);
    assert_eq!(library.borrower(borrower).await.open_loans().count(), 1);
}

#[tokio::test]
async fn test_return_without_open_entry_keeps_copies() {
    let library = Library::new();
    let book = library.add_book(2, 2).await;
    let borrower = library.add_borrower("Lebannen").await;
    let transaction = assert_ok!(library.borrow(book, borrower, day(1)).await);

    // Entry closed behind the workflow's back
    assert_ok!(
        library
            .store
            .close_borrowed_entry(borrower, book, day(4))
            .await
    );

    let result = library
        .service
        .return_book(transaction.transaction_reference, day(6))
        .await;

    match result {
        Err(AppError::NoMatchingBorrowRecord {
            borrower_reference,
            book_reference,
        }) => {
            assert_eq!(borrower_reference, borrower);
            assert_eq!(book_reference, book);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert_eq!(library.available(book).await, 1);
    let stored = assert_ok!(library.service.get_by_reference(transaction.transaction_reference).await);
    assert_eq!(stored.status, TransactionStatus::Borrowed);
}

#[tokio::test]
async fn test_second_return_is_rejected() {
    let library = Library::new();
    let book = library.add_book(1, 1).await;
    let borrower = library.add_borrower("Irian").await;
    let transaction = assert_ok!(library.borrow(book, borrower, day(1)).await);

    assert_ok!(
        library
            .service
            .return_book(transaction.transaction_reference, day(2))
            .await
    );
    let again = library
        .service
        .return_book(transaction.transaction_reference, day(3))
        .await;

    assert!(matches!(again, Err(AppError::AlreadyReturned(_))));
    assert_eq!(library.available(book).await, 1);

    let stored = assert_ok!(library.service.get_by_reference(transaction.transaction_reference).await);
    assert_eq!(stored.return_date, Some(day(2)));
}

#[tokio::test]
async fn test_decrease_past_zero_is_forbidden() {
    let library = Library::new();
    let book = library.add_book(1, 1).await;

    assert_ok!(library.store.decrease_available_copies(book).await);
    let result = library.store.decrease_available_copies(book).await;

    assert!(matches!(assert_err!(result), AppError::ForbiddenOperation(_)));
    assert_eq!(library.available(book).await, 0);
}

#[tokio::test]
async fn test_increase_is_capped_at_total() {
    let library = Library::new();
    let book = library.add_book(2, 2).await;

    let result = library.store.increase_available_copies(book).await;
    assert!(matches!(assert_err!(result), AppError::ForbiddenOperation(_)));
    assert_eq!(library.available(book).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_never_oversell() {
    let library = Arc::new(Library::new());
    let book = library.add_book(1, 1).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let borrower = library.add_borrower(&format!("Reader{}", i)).await;
        let library = library.clone();
        handles.push(tokio::spawn(async move {
            library.borrow(book, borrower, day(1)).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::BookUnavailable(_)) | Err(AppError::NoAvailableCopies(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(library.available(book).await, 0);
    assert_eq!(library.store.transactions().await.len(), 1);
}

#[tokio::test]
async fn test_interleaved_borrows_by_one_borrower_keep_one_open_loan() {
    let library = Library::new();
    let book = library.add_book(3, 3).await;
    let borrower = library.add_borrower("Therru").await;

    let store = library.store.clone();
    let service = TransactionsService::new(
        store.clone(),
        Arc::new(YieldingBorrowers(store.clone())),
        store.clone(),
        LoanPolicy::default(),
    );
    let request = || CreateBookTransaction {
        book_reference: book,
        borrower_reference: borrower,
        transaction_date: day(1),
    };

    let (first, second) = tokio::join!(service.borrow_book(request()), service.borrow_book(request()));

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::DuplicateOpenLoan(_)))));

    assert_eq!(library.available(book).await, 2);
    assert_eq!(library.borrower(borrower).await.open_loans().count(), 1);
    assert_eq!(library.store.transactions().await.len(), 1);
}

#[tokio::test]
async fn test_interleaved_returns_of_one_transaction_apply_once() {
    let library = Library::with_policy(LoanPolicy {
        allow_duplicate_open_loans: true,
    });
    let book = library.add_book(3, 3).await;
    let borrower = library.add_borrower("Alder").await;
    let first = assert_ok!(library.borrow(book, borrower, day(1)).await);
    let second = assert_ok!(library.borrow(book, borrower, day(2)).await);
    assert_eq!(library.available(book).await, 1);

    let store = library.store.clone();
    let service = TransactionsService::new(
        store.clone(),
        store.clone(),
        Arc::new(YieldingTransactions(store.clone())),
        LoanPolicy {
            allow_duplicate_open_loans: true,
        },
    );
    let reference = first.transaction_reference;

    let (a, b) = tokio::join!(
        service.return_book(reference, day(10)),
        service.return_book(reference, day(10))
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::AlreadyReturned(_)))));

    // The second loan is untouched
    assert_eq!(library.available(book).await, 2);
    assert_eq!(library.borrower(borrower).await.open_loans().count(), 1);
    let still_out = assert_ok!(library.service.get_by_reference(second.transaction_reference).await);
    assert_eq!(still_out.status, TransactionStatus::Borrowed);
    let returned = assert_ok!(library.service.get_by_reference(reference).await);
    assert_eq!(returned.status, TransactionStatus::Returned);
}
