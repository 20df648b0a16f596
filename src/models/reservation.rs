//! Reservation model and status state machine

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use super::user::BorrowerRole;

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Approved => "Approved",
            ReservationStatus::Rejected => "Rejected",
            ReservationStatus::Fulfilled => "Fulfilled",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::Expired => "Expired",
        }
    }

    /// A reservation counts against the per-user cap and the one-per-book
    /// rule while Pending or Approved.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Approved)
    }

    /// Transition table for the reservation state machine. Terminal states
    /// (Rejected, Fulfilled, Cancelled, Expired) admit no further moves.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Pending, Expired)
                | (Approved, Fulfilled)
                | (Approved, Cancelled)
                | (Approved, Expired)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "approved" => Ok(ReservationStatus::Approved),
            "rejected" => Ok(ReservationStatus::Rejected),
            "fulfilled" => Ok(ReservationStatus::Fulfilled),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "expired" => Ok(ReservationStatus::Expired),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

// SQLx conversion for ReservationStatus (stored as text)
impl sqlx::Type<Postgres> for ReservationStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ReservationStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ReservationStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Reservation model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub reservation_id: String,
    pub book_id: i32,
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: String,
    pub user_role: BorrowerRole,
    pub lrn: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub reserve_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub requested_at: DateTime<Utc>,
}

/// Create reservation request. The book may be referenced by id or ISBN.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    pub book_id: Option<i32>,
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    pub user_email: Option<String>,
    #[validate(length(min = 1, message = "user_name is required"))]
    pub user_name: String,
    pub user_role: BorrowerRole,
    pub lrn: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub reserve_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

const RESERVATION_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a human-readable reservation id
pub fn generate_reservation_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..RESERVATION_ID_CHARSET.len());
            RESERVATION_ID_CHARSET[idx] as char
        })
        .collect();
    format!("RSV-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;

    #[test]
    fn pending_moves_to_review_outcomes() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Expired));
        assert!(!Pending.can_transition_to(Fulfilled));
    }

    #[test]
    fn approved_moves_to_pickup_outcomes() {
        assert!(Approved.can_transition_to(Fulfilled));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Expired));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Rejected, Fulfilled, Cancelled, Expired] {
            for next in [Pending, Approved, Rejected, Fulfilled, Cancelled, Expired] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next} must be illegal");
            }
        }
    }

    #[test]
    fn self_transitions_are_illegal() {
        for status in [Pending, Approved] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn only_pending_and_approved_are_active() {
        assert!(Pending.is_active());
        assert!(Approved.is_active());
        for status in [Rejected, Fulfilled, Cancelled, Expired] {
            assert!(!status.is_active());
        }
    }

    #[test]
    fn reservation_ids_carry_prefix() {
        let id = generate_reservation_id(Utc::now());
        assert!(id.starts_with("RSV-"));
    }
}
