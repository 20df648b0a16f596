//! Borrowing (circulation ledger) model and related types

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use super::user::BorrowerRole;

/// Borrowing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BorrowStatus {
    Pending,
    Borrowed,
    Returned,
    Overdue,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "Pending",
            BorrowStatus::Borrowed => "Borrowed",
            BorrowStatus::Returned => "Returned",
            BorrowStatus::Overdue => "Overdue",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BorrowStatus::Pending),
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "returned" => Ok(BorrowStatus::Returned),
            "overdue" => Ok(BorrowStatus::Overdue),
            _ => Err(format!("Invalid borrowing status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowStatus (stored as text)
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrowing model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub transaction_id: String,
    pub book_id: i32,
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: String,
    pub user_role: BorrowerRole,
    pub borrower_type: Option<String>,
    pub lrn: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
}

/// Ledger row joined with book info and computed due/overdue fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingDetails {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub book_title: String,
    pub book_isbn: String,
    /// Days past the due date, 0 when not overdue
    pub days_overdue: i64,
    /// Days until the due date, 0 once overdue
    pub days_until_due: i64,
}

/// Submit borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitBorrow {
    pub book_id: i32,
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    pub user_email: Option<String>,
    #[validate(length(min = 1, message = "user_name is required"))]
    pub user_name: String,
    pub user_role: BorrowerRole,
    pub borrower_type: Option<String>,
    pub lrn: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Explicit pre-approval flag; forces the direct-issue path
    #[serde(default)]
    pub approved: bool,
    /// Client-supplied transaction id; generated when absent
    pub transaction_id: Option<String>,
}

/// Outcome of a borrow submission
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowOutcome {
    pub transaction_id: String,
    pub status: BorrowStatus,
    pub is_direct_issue: bool,
    pub book_info: BorrowedBookInfo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowedBookInfo {
    pub title: String,
    pub available_after: i16,
    pub total_quantity: i16,
}

const TRANSACTION_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a human-readable transaction id: prefix, millisecond timestamp,
/// short random suffix.
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..TRANSACTION_ID_CHARSET.len());
            TRANSACTION_ID_CHARSET[idx] as char
        })
        .collect();
    format!("TXN-{}-{}", now.timestamp_millis(), suffix)
}

/// Effective status of a ledger row at `now`. A Borrowed row past its due
/// date reads as Overdue; every other status is returned unchanged. This is
/// the single source of truth for overdue derivation: the persisted sweep
/// only makes reporting rows converge to the same answer.
pub fn effective_status(status: BorrowStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> BorrowStatus {
    match status {
        BorrowStatus::Borrowed if due_date < now => BorrowStatus::Overdue,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn borrowed_past_due_reads_overdue() {
        let now = Utc::now();
        let due = now - Duration::days(1);
        assert_eq!(effective_status(BorrowStatus::Borrowed, due, now), BorrowStatus::Overdue);
    }

    #[test]
    fn borrowed_before_due_stays_borrowed() {
        let now = Utc::now();
        let due = now + Duration::days(7);
        assert_eq!(effective_status(BorrowStatus::Borrowed, due, now), BorrowStatus::Borrowed);
    }

    #[test]
    fn pending_and_returned_never_flip() {
        let now = Utc::now();
        let due = now - Duration::days(30);
        assert_eq!(effective_status(BorrowStatus::Pending, due, now), BorrowStatus::Pending);
        assert_eq!(effective_status(BorrowStatus::Returned, due, now), BorrowStatus::Returned);
        assert_eq!(effective_status(BorrowStatus::Overdue, due, now), BorrowStatus::Overdue);
    }

    #[test]
    fn transaction_ids_carry_prefix_and_suffix() {
        let now = Utc::now();
        let id = generate_transaction_id(now);
        assert!(id.starts_with("TXN-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn transaction_ids_are_practically_unique() {
        let now = Utc::now();
        let a = generate_transaction_id(now);
        let b = generate_transaction_id(now);
        // Same timestamp, random suffixes; collisions are possible but
        // vanishingly unlikely across two draws.
        assert!(a.starts_with("TXN-") && b.starts_with("TXN-"));
    }
}
