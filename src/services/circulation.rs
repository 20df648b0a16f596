//! Circulation service: borrow, approval, return and overdue workflows
//!
//! Every check-then-act sequence against the inventory runs inside a single
//! transaction holding the book-row lock, so two requests racing for the
//! last copy serialize at the database.

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::borrowing::{
        generate_transaction_id, BorrowOutcome, BorrowStatus, BorrowedBookInfo, BorrowingDetails,
        SubmitBorrow,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Submit a borrow request. Librarian issuers (and requests carrying the
    /// explicit approved flag) go through direct issue: the ledger row is
    /// created Borrowed and a copy comes off the shelf in the same
    /// transaction. Everyone else starts Pending, which holds no copy until
    /// approval.
    pub async fn submit_borrow(
        &self,
        request: SubmitBorrow,
        issuer_is_librarian: bool,
    ) -> AppResult<BorrowOutcome> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if request.due_date < request.borrow_date {
            return Err(AppError::Validation(
                "due_date must not precede borrow_date".to_string(),
            ));
        }

        let direct_issue = issuer_is_librarian || request.approved;

        let transaction_id = request
            .transaction_id
            .clone()
            .unwrap_or_else(|| generate_transaction_id(Utc::now()));

        if direct_issue {
            self.issue_directly(request, transaction_id).await
        } else {
            self.submit_pending(request, transaction_id).await
        }
    }

    /// Direct issue path: lock, check, insert, decrement. The whole sequence
    /// commits or rolls back as one unit.
    async fn issue_directly(
        &self,
        request: SubmitBorrow,
        transaction_id: String,
    ) -> AppResult<BorrowOutcome> {
        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        let locked = self
            .repository
            .books
            .lock_for_update(&mut tx, request.book_id)
            .await?;

        if locked.available_quantity <= 0 {
            return Err(AppError::InsufficientCopies(format!(
                "All {} copies of \"{}\" are currently borrowed",
                locked.quantity, locked.title
            )));
        }

        self.repository
            .borrowings
            .insert(&mut tx, &request, &transaction_id, BorrowStatus::Borrowed)
            .await?;

        let available_after = self
            .repository
            .books
            .decrement_available(&mut tx, request.book_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction_id,
            book_id = request.book_id,
            available_after,
            "Direct issue committed"
        );

        Ok(BorrowOutcome {
            transaction_id,
            status: BorrowStatus::Borrowed,
            is_direct_issue: true,
            book_info: BorrowedBookInfo {
                title: locked.title,
                available_after,
                total_quantity: locked.quantity,
            },
        })
    }

    /// Self-service path: the Pending row holds no copy. Availability is
    /// still checked so an obviously futile request fails early, but the
    /// count is left untouched.
    async fn submit_pending(
        &self,
        request: SubmitBorrow,
        transaction_id: String,
    ) -> AppResult<BorrowOutcome> {
        let book = self.repository.books.get_by_id(request.book_id).await?;

        if book.available_quantity <= 0 {
            return Err(AppError::InsufficientCopies(format!(
                "All {} copies of \"{}\" are currently borrowed",
                book.quantity, book.title
            )));
        }

        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;
        self.repository
            .borrowings
            .insert(&mut tx, &request, &transaction_id, BorrowStatus::Pending)
            .await?;
        tx.commit().await?;

        Ok(BorrowOutcome {
            transaction_id,
            status: BorrowStatus::Pending,
            is_direct_issue: false,
            book_info: BorrowedBookInfo {
                title: book.title,
                available_after: book.available_quantity,
                total_quantity: book.quantity,
            },
        })
    }

    /// Approve a Pending request: status moves to Borrowed and one copy
    /// comes off the shelf, clamped at zero. Pending never reserved the
    /// copy, so approving a second request for the last copy clamps rather
    /// than fails; that asymmetry is the accepted two-phase model.
    pub async fn approve(&self, transaction_id: &str) -> AppResult<()> {
        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        let book_id = self
            .repository
            .borrowings
            .approve_pending(&mut tx, transaction_id)
            .await?;

        self.repository.books.lock_for_update(&mut tx, book_id).await?;
        let available_after = self
            .repository
            .books
            .decrement_available(&mut tx, book_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction_id,
            book_id,
            available_after,
            "Borrowing approved"
        );

        Ok(())
    }

    /// Reject a Pending request: the row is deleted and inventory stays
    /// untouched, the mirror image of approve.
    pub async fn reject(&self, transaction_id: &str) -> AppResult<()> {
        self.repository.borrowings.delete_pending(transaction_id).await?;

        tracing::info!(transaction_id = %transaction_id, "Borrowing rejected");
        Ok(())
    }

    /// Return a Borrowed/Overdue copy: status moves to Returned and one copy
    /// goes back on the shelf, capped at the total owned.
    pub async fn return_book(
        &self,
        transaction_id: &str,
        return_date: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let return_date = return_date.unwrap_or_else(Utc::now);

        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        let book_id = self
            .repository
            .borrowings
            .mark_returned(&mut tx, transaction_id, return_date)
            .await?;

        let available_after = self
            .repository
            .books
            .increment_available(&mut tx, book_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction_id,
            book_id,
            available_after,
            "Borrowing returned"
        );

        Ok(())
    }

    /// List ledger rows by status, sweeping overdue rows first so the
    /// persisted column matches the derived status.
    pub async fn list_by_status(&self, status: BorrowStatus) -> AppResult<Vec<BorrowingDetails>> {
        let swept = self.repository.borrowings.sweep_overdue().await?;
        if swept > 0 {
            tracing::debug!(swept, "Marked borrowings overdue");
        }

        self.repository.borrowings.list_by_status(status).await
    }
}
