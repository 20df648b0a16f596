//! Borrowings repository: the circulation ledger

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{
        effective_status, BorrowStatus, Borrowing, BorrowingDetails, SubmitBorrow,
    },
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get ledger row by transaction id
    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Borrowing {} not found", transaction_id))
            })
    }

    /// Insert a ledger row inside the caller's transaction
    pub async fn insert(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        request: &SubmitBorrow,
        transaction_id: &str,
        status: BorrowStatus,
    ) -> AppResult<Borrowing> {
        let row = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (
                transaction_id, book_id, user_id, user_email, user_name, user_role,
                borrower_type, lrn, section, grade_level, employee_id, department,
                borrow_date, due_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(request.book_id)
        .bind(&request.user_id)
        .bind(&request.user_email)
        .bind(&request.user_name)
        .bind(request.user_role)
        .bind(&request.borrower_type)
        .bind(&request.lrn)
        .bind(&request.section)
        .bind(&request.grade_level)
        .bind(&request.employee_id)
        .bind(&request.department)
        .bind(request.borrow_date)
        .bind(request.due_date)
        .bind(status)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Move a Pending row to Borrowed, returning its book id. Unknown ids,
    /// already-approved and rejected rows all surface as the same NotFound:
    /// absence of a Pending row is the only signal.
    pub async fn approve_pending(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        transaction_id: &str,
    ) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE borrowings SET status = 'Borrowed'
            WHERE transaction_id = $1 AND status = 'Pending'
            RETURNING book_id
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Pending borrowing not found".to_string()))
    }

    /// Delete a Pending row outright. Rejection keeps no tombstone and, since
    /// Pending never decremented inventory, makes no inventory adjustment.
    pub async fn delete_pending(&self, transaction_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM borrowings WHERE transaction_id = $1 AND status = 'Pending'",
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Pending borrowing not found".to_string()));
        }
        Ok(())
    }

    /// Move a Borrowed/Overdue row to Returned, returning its book id
    pub async fn mark_returned(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        transaction_id: &str,
        return_date: DateTime<Utc>,
    ) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE borrowings SET status = 'Returned', return_date = $2
            WHERE transaction_id = $1 AND status IN ('Borrowed', 'Overdue')
            RETURNING book_id
            "#,
        )
        .bind(transaction_id)
        .bind(return_date)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Active borrowing not found".to_string())
        })
    }

    /// Persist the Overdue status for every Borrowed row past its due date.
    /// Run before status-partitioned list queries so reporting rows converge
    /// with `effective_status`; inventory is untouched.
    pub async fn sweep_overdue(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE borrowings SET status = 'Overdue' WHERE status = 'Borrowed' AND due_date < NOW()",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// List ledger rows by status, joined with book info and computed
    /// due/overdue day counts
    pub async fn list_by_status(&self, status: BorrowStatus) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, k.title AS book_title, k.isbn AS book_isbn
            FROM borrowings b
            JOIN books k ON b.book_id = k.id
            WHERE b.status = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();

        let mut result = Vec::new();
        for row in rows {
            let borrowing = Borrowing {
                id: row.get("id"),
                transaction_id: row.get("transaction_id"),
                book_id: row.get("book_id"),
                user_id: row.get("user_id"),
                user_email: row.get("user_email"),
                user_name: row.get("user_name"),
                user_role: row.get("user_role"),
                borrower_type: row.get("borrower_type"),
                lrn: row.get("lrn"),
                section: row.get("section"),
                grade_level: row.get("grade_level"),
                employee_id: row.get("employee_id"),
                department: row.get("department"),
                borrow_date: row.get("borrow_date"),
                due_date: row.get("due_date"),
                return_date: row.get("return_date"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            };

            let due_date = borrowing.due_date;
            let status = effective_status(borrowing.status, due_date, now);
            let days_overdue = if status == BorrowStatus::Overdue {
                (now - due_date).num_days().max(0)
            } else {
                0
            };
            let days_until_due = if matches!(status, BorrowStatus::Pending | BorrowStatus::Borrowed)
            {
                (due_date - now).num_days().max(0)
            } else {
                0
            };

            result.push(BorrowingDetails {
                borrowing: Borrowing { status, ..borrowing },
                book_title: row.get("book_title"),
                book_isbn: row.get("book_isbn"),
                days_overdue,
                days_until_due,
            });
        }

        Ok(result)
    }

    /// Whether any Pending/Borrowed/Overdue row references this book.
    /// Blocks title deletion.
    pub async fn has_active_for_book(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowings
                WHERE book_id = $1 AND status IN ('Pending', 'Borrowed', 'Overdue')
            )
            "#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
