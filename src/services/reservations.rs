//! Reservation service: creation rules and the status state machine
//!
//! Reservations are a future-pickup ledger: they never hold a copy. The only
//! reservation event that touches inventory is fulfillment, which converts
//! an Approved reservation into a Borrowed ledger row and takes the copy in
//! the same transaction.

use chrono::Utc;
use validator::Validate;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        borrowing::{generate_transaction_id, BorrowStatus, SubmitBorrow},
        reservation::{
            generate_reservation_id, CreateReservation, Reservation, ReservationStatus,
        },
        user::BorrowerRole,
    },
    repository::Repository,
};

/// Outcome of a status transition; fulfillment also yields the ledger
/// transaction id it created.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub reservation: Reservation,
    pub transaction_id: Option<String>,
}

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    config: CirculationConfig,
}

impl ReservationsService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    fn cap_for_role(&self, role: BorrowerRole) -> i64 {
        match role {
            BorrowerRole::Student => self.config.student_reservation_cap,
            BorrowerRole::Teacher | BorrowerRole::Librarian => {
                self.config.teacher_reservation_cap
            }
        }
    }

    /// Create a Pending reservation after the stock, duplication and cap
    /// checks. Reservations check raw `quantity`, not `available_quantity`:
    /// a fully lent title can still be reserved for future pickup.
    pub async fn create(&self, request: CreateReservation) -> AppResult<Reservation> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let book = match (request.book_id, request.isbn.as_deref()) {
            (Some(id), _) => self.repository.books.get_by_id(id).await?,
            (None, Some(isbn)) => self.repository.books.get_by_isbn(isbn).await?,
            (None, None) => {
                return Err(AppError::Validation(
                    "book_id or isbn is required".to_string(),
                ))
            }
        };

        if book.quantity <= 0 {
            return Err(AppError::OutOfStock(format!(
                "\"{}\" has no copies in stock",
                book.title
            )));
        }

        // The duplicate and cap checks and the insert run under one
        // transaction holding the per-user advisory lock, so two concurrent
        // creates for the same user serialize instead of both passing the
        // checks.
        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        self.repository
            .reservations
            .lock_user(&mut tx, &request.user_id)
            .await?;

        if self
            .repository
            .reservations
            .has_active_for_user_book(&mut tx, &request.user_id, book.id)
            .await?
        {
            return Err(AppError::DuplicateActive(format!(
                "An active reservation for \"{}\" already exists",
                book.title
            )));
        }

        let cap = self.cap_for_role(request.user_role);
        let active = self
            .repository
            .reservations
            .count_active_for_user(&mut tx, &request.user_id)
            .await?;
        if active >= cap {
            return Err(AppError::LimitExceeded(format!(
                "Active reservation limit reached ({}/{})",
                active, cap
            )));
        }

        let reservation_id = generate_reservation_id(Utc::now());
        let reservation = self
            .repository
            .reservations
            .insert(&mut tx, &request, book.id, &reservation_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation.reservation_id,
            book_id = book.id,
            user_id = %reservation.user_id,
            "Reservation created"
        );

        Ok(reservation)
    }

    /// List a user's reservations, optionally filtered by status
    pub async fn list_user(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> AppResult<Vec<Reservation>> {
        let status = status
            .map(|s| s.parse::<ReservationStatus>())
            .transpose()
            .map_err(AppError::Validation)?;

        self.repository.reservations.list_user(user_id, status).await
    }

    /// Drive the reservation state machine. Illegal moves fail with a
    /// transition error; the Approved -> Fulfilled edge is the pickup event
    /// and is the single point where a reservation touches inventory.
    pub async fn set_status(
        &self,
        reservation_id: &str,
        new_status: ReservationStatus,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        let current = self
            .repository
            .reservations
            .get_for_update(&mut tx, reservation_id)
            .await?;

        if !current.status.can_transition_to(new_status) {
            return Err(AppError::Transition(format!(
                "Reservation {} cannot move from {} to {}",
                reservation_id, current.status, new_status
            )));
        }

        let transaction_id = if new_status == ReservationStatus::Fulfilled {
            Some(self.fulfill(&mut tx, &current).await?)
        } else {
            None
        };

        let reservation = self
            .repository
            .reservations
            .set_status(&mut tx, reservation_id, new_status)
            .await?;

        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation_id,
            from = %current.status,
            to = %new_status,
            "Reservation transitioned"
        );

        Ok(TransitionOutcome {
            reservation,
            transaction_id,
        })
    }

    /// Pickup: take one copy (strict, the borrower is standing at the desk)
    /// and open a Borrowed ledger row carrying the reservation's identity
    /// and dates.
    async fn fulfill(
        &self,
        tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
        reservation: &Reservation,
    ) -> AppResult<String> {
        self.repository
            .books
            .decrement_available_strict(tx, reservation.book_id)
            .await?;

        let now = Utc::now();
        let transaction_id = generate_transaction_id(now);
        let borrow = SubmitBorrow {
            book_id: reservation.book_id,
            user_id: reservation.user_id.clone(),
            user_email: reservation.user_email.clone(),
            user_name: reservation.user_name.clone(),
            user_role: reservation.user_role,
            borrower_type: Some(reservation.user_role.as_str().to_string()),
            lrn: reservation.lrn.clone(),
            section: reservation.section.clone(),
            grade_level: reservation.grade_level.clone(),
            employee_id: reservation.employee_id.clone(),
            department: reservation.department.clone(),
            borrow_date: now,
            due_date: reservation.return_date,
            approved: true,
            transaction_id: Some(transaction_id.clone()),
        };

        self.repository
            .borrowings
            .insert(tx, &borrow, &transaction_id, BorrowStatus::Borrowed)
            .await?;

        Ok(transaction_id)
    }

    /// Cancel the caller's own reservation. Rows that belong to someone
    /// else, or that are no longer Pending/Approved, surface as NotFound.
    pub async fn cancel(&self, reservation_id: &str, user_id: &str) -> AppResult<Reservation> {
        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;

        let current = self
            .repository
            .reservations
            .get_for_update(&mut tx, reservation_id)
            .await?;

        if current.user_id != user_id || !current.status.is_active() {
            return Err(AppError::NotFound(format!(
                "Active reservation {} not found",
                reservation_id
            )));
        }

        // Neither Pending nor Approved ever held a copy, so cancellation
        // restores nothing.
        let reservation = self
            .repository
            .reservations
            .set_status(&mut tx, reservation_id, ReservationStatus::Cancelled)
            .await?;

        tx.commit().await?;

        tracing::info!(reservation_id = %reservation_id, "Reservation cancelled");
        Ok(reservation)
    }

    /// Expire every active reservation past its pickup window
    pub async fn mark_expired(&self) -> AppResult<i64> {
        let expired = self.repository.reservations.mark_expired().await?;
        if expired > 0 {
            tracing::info!(expired, "Expired stale reservations");
        }
        Ok(expired)
    }
}
