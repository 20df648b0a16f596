//! Reservations repository

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{CreateReservation, Reservation, ReservationStatus},
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by its public id
    pub async fn get_by_reservation_id(&self, reservation_id: &str) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE reservation_id = $1",
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Reservation {} not found", reservation_id))
        })
    }

    /// Same, but locked inside the caller's transaction so a status
    /// transition reads a stable current state
    pub async fn get_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        reservation_id: &str,
    ) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE reservation_id = $1 FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Reservation {} not found", reservation_id))
        })
    }

    /// Serialize concurrent reservation creation for one user. The advisory
    /// lock is released at transaction end, so the cap and duplicate checks
    /// that follow see a settled active set.
    pub async fn lock_user(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: &str,
    ) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Count a user's active (Pending/Approved) reservations
    pub async fn count_active_for_user(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: &str,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE user_id = $1 AND status IN ('Pending', 'Approved')
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count)
    }

    /// Whether the user already holds an active reservation for this book
    pub async fn has_active_for_user_book(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        user_id: &str,
        book_id: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE user_id = $1 AND book_id = $2 AND status IN ('Pending', 'Approved')
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(exists)
    }

    /// Whether any active reservation references this book. Blocks title
    /// deletion alongside the active-borrowings check.
    pub async fn has_active_for_book(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE book_id = $1 AND status IN ('Pending', 'Approved')
            )
            "#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new Pending reservation. The partial unique index on
    /// (user_id, book_id) backs the duplicate check at the schema level.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        request: &CreateReservation,
        book_id: i32,
        reservation_id: &str,
    ) -> AppResult<Reservation> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                reservation_id, book_id, user_id, user_email, user_name, user_role,
                lrn, section, grade_level, employee_id, department,
                reserve_date, return_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'Pending')
            RETURNING *
            "#,
        )
        .bind(reservation_id)
        .bind(book_id)
        .bind(&request.user_id)
        .bind(&request.user_email)
        .bind(&request.user_name)
        .bind(request.user_role)
        .bind(&request.lrn)
        .bind(&request.section)
        .bind(&request.grade_level)
        .bind(&request.employee_id)
        .bind(&request.department)
        .bind(request.reserve_date)
        .bind(request.return_date)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateActive(
                "An active reservation for this book already exists".to_string(),
            ),
            _ => AppError::from(e),
        })?;

        Ok(row)
    }

    /// List a user's reservations, optionally filtered by status
    pub async fn list_user(
        &self,
        user_id: &str,
        status: Option<ReservationStatus>,
    ) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY requested_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str().to_string()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Persist a status transition inside the caller's transaction. Legality
    /// is the service's concern; this only writes.
    pub async fn set_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> AppResult<Reservation> {
        let row = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $2 WHERE reservation_id = $1 RETURNING *",
        )
        .bind(reservation_id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Reservation {} not found", reservation_id))
        })?;

        Ok(row)
    }

    /// Expire every active reservation whose intended pickup window has
    /// passed. A single statement with RETURNING gives the exact set of
    /// affected rows, so there is no time-window guessing about which rows
    /// just flipped.
    pub async fn mark_expired(&self) -> AppResult<i64> {
        let expired: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE reservations SET status = 'Expired'
            WHERE status IN ('Pending', 'Approved') AND return_date < NOW()
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(expired.len() as i64)
    }
}
