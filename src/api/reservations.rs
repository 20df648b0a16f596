//! Reservation workflow endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{CreateReservation, Reservation, ReservationStatus},
};

use super::AuthenticatedUser;

/// Single-reservation response
#[derive(Serialize, ToSchema)]
pub struct ReservationResponse {
    pub success: bool,
    pub reservation_id: String,
    pub data: Reservation,
}

/// Reservation list response
#[derive(Serialize, ToSchema)]
pub struct ReservationListResponse {
    pub success: bool,
    pub data: Vec<Reservation>,
}

/// Status transition request
#[derive(Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Status transition response. Fulfillment also reports the ledger
/// transaction it opened.
#[derive(Serialize, ToSchema)]
pub struct TransitionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Cancel request body
#[derive(Deserialize, ToSchema)]
pub struct CancelRequest {
    pub user_id: String,
}

/// Expiry sweep response
#[derive(Serialize, ToSchema)]
pub struct MarkExpiredResponse {
    pub success: bool,
    pub expired_count: i64,
}

/// User reservation list query
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReservationListQuery {
    pub status: Option<String>,
}

/// Create a reservation
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Invalid request, out of stock, duplicate or limit reached"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    let reservation = state.services.reservations.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            success: true,
            reservation_id: reservation.reservation_id.clone(),
            data: reservation,
        }),
    ))
}

/// List a user's reservations
#[utoipa::path(
    get,
    path = "/reservations/user/{user_id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = String, Path, description = "User ID"),
        ReservationListQuery
    ),
    responses(
        (status = 200, description = "User's reservations", body = ReservationListResponse),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_user_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(user_id): Path<String>,
    Query(query): Query<ReservationListQuery>,
) -> AppResult<Json<ReservationListResponse>> {
    let reservations = state
        .services
        .reservations
        .list_user(&user_id, query.status.as_deref())
        .await?;

    Ok(Json(ReservationListResponse {
        success: true,
        data: reservations,
    }))
}

/// Drive a reservation through its state machine. Illegal transitions are
/// rejected; Approved -> Fulfilled is the pickup event.
#[utoipa::path(
    post,
    path = "/reservations/{reservation_id}/status",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("reservation_id" = String, Path, description = "Reservation ID")
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TransitionResponse),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Illegal transition")
    )
)]
pub async fn set_reservation_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reservation_id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> AppResult<Json<TransitionResponse>> {
    claims.require_librarian()?;

    let status: ReservationStatus = request.status.parse().map_err(AppError::Validation)?;
    let outcome = state
        .services
        .reservations
        .set_status(&reservation_id, status)
        .await?;

    Ok(Json(TransitionResponse {
        success: true,
        message: format!("Reservation {}", outcome.reservation.status),
        transaction_id: outcome.transaction_id,
    }))
}

/// Cancel the caller's own reservation
#[utoipa::path(
    delete,
    path = "/reservations/{reservation_id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("reservation_id" = String, Path, description = "Reservation ID")
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationResponse),
        (status = 404, description = "Active reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(reservation_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = state
        .services
        .reservations
        .cancel(&reservation_id, &request.user_id)
        .await?;

    Ok(Json(ReservationResponse {
        success: true,
        reservation_id: reservation.reservation_id.clone(),
        data: reservation,
    }))
}

/// Expire stale reservations
#[utoipa::path(
    post,
    path = "/reservations/mark-expired",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Expiry sweep complete", body = MarkExpiredResponse)
    )
)]
pub async fn mark_expired(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MarkExpiredResponse>> {
    claims.require_librarian()?;

    let expired_count = state.services.reservations.mark_expired().await?;

    Ok(Json(MarkExpiredResponse {
        success: true,
        expired_count,
    }))
}
