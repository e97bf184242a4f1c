//! Book transaction (borrow/return) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Transaction state; the only transition is Borrowed to Returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Borrowed,
    Returned,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Borrowed => "borrowed",
            TransactionStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(TransactionStatus::Borrowed),
            "returned" => Ok(TransactionStatus::Returned),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

// SQLx conversion for TransactionStatus
impl sqlx::Type<Postgres> for TransactionStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for TransactionStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for TransactionStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book transaction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookTransaction {
    pub transaction_reference: Uuid,
    pub book_reference: Uuid,
    pub borrower_reference: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub status: TransactionStatus,
    /// Set only once the transaction is returned
    pub return_date: Option<DateTime<Utc>>,
}

impl BookTransaction {
    /// New transaction in the Borrowed state
    pub fn borrowed(data: &CreateBookTransaction) -> Self {
        Self {
            transaction_reference: Uuid::new_v4(),
            book_reference: data.book_reference,
            borrower_reference: data.borrower_reference,
            transaction_date: data.transaction_date,
            status: TransactionStatus::Borrowed,
            return_date: None,
        }
    }

    pub fn is_returned(&self) -> bool {
        self.status == TransactionStatus::Returned
    }

    pub fn mark_returned(&mut self, return_date: DateTime<Utc>) -> AppResult<()> {
        if self.is_returned() {
            return Err(AppError::AlreadyReturned(
                self.transaction_reference.to_string(),
            ));
        }
        self.status = TransactionStatus::Returned;
        self.return_date = Some(return_date);
        Ok(())
    }
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookTransaction {
    pub book_reference: Uuid,
    pub borrower_reference: Uuid,
    /// ISO 8601 date of the loan
    pub transaction_date: DateTime<Utc>,
}

/// Return request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReturnBookTransaction {
    /// ISO 8601 date the book came back
    pub return_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> CreateBookTransaction {
        CreateBookTransaction {
            book_reference: Uuid::new_v4(),
            borrower_reference: Uuid::new_v4(),
            transaction_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_borrowed_has_no_return_date() {
        let transaction = BookTransaction::borrowed(&request());
        assert_eq!(transaction.status, TransactionStatus::Borrowed);
        assert!(transaction.return_date.is_none());
    }

    #[test]
    fn test_mark_returned_once() {
        let mut transaction = BookTransaction::borrowed(&request());
        let date = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        transaction.mark_returned(date).unwrap();
        assert!(transaction.is_returned());
        assert_eq!(transaction.return_date, Some(date));

        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let again = transaction.mark_returned(later);
        assert!(matches!(again, Err(AppError::AlreadyReturned(_))));
        assert_eq!(transaction.return_date, Some(date));
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&TransactionStatus::Returned).unwrap();
        assert_eq!(json, "\"returned\"");
        assert_eq!("Borrowed".parse::<TransactionStatus>(), Ok(TransactionStatus::Borrowed));
        assert!("lost".parse::<TransactionStatus>().is_err());
    }
}
