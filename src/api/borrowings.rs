//! Borrowing workflow endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::borrowing::{BorrowOutcome, BorrowStatus, BorrowingDetails, SubmitBorrow},
};

use super::AuthenticatedUser;

/// Borrow submission response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: BorrowOutcome,
}

/// Status-partitioned ledger list response
#[derive(Serialize, ToSchema)]
pub struct BorrowingListResponse {
    pub success: bool,
    pub data: Vec<BorrowingDetails>,
}

/// Generic workflow message response
#[derive(Serialize, ToSchema)]
pub struct WorkflowResponse {
    pub success: bool,
    pub message: String,
}

/// Return request body
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Return date; defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Submit a borrow request. Librarian callers get direct issue; everyone
/// else starts Pending.
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = SubmitBorrow,
    responses(
        (status = 201, description = "Borrow request recorded", body = BorrowResponse),
        (status = 400, description = "Invalid request or no copies available"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn submit_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SubmitBorrow>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let outcome = state
        .services
        .circulation
        .submit_borrow(request, claims.is_librarian())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            success: true,
            outcome,
        }),
    ))
}

/// Issue a book directly to a walk-in borrower. Librarian only; the ledger
/// row is created Borrowed and inventory decremented in one transaction.
#[utoipa::path(
    post,
    path = "/borrowings/direct",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = SubmitBorrow,
    responses(
        (status = 201, description = "Book issued", body = BorrowResponse),
        (status = 400, description = "Invalid request or no copies available"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn direct_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(mut request): Json<SubmitBorrow>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    claims.require_librarian()?;

    // No Pending path on this endpoint
    request.approved = true;

    let outcome = state
        .services
        .circulation
        .submit_borrow(request, true)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            success: true,
            outcome,
        }),
    ))
}

/// List ledger rows by status
#[utoipa::path(
    get,
    path = "/borrowings/status/{status}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("status" = String, Path, description = "Pending, Borrowed, Returned or Overdue")
    ),
    responses(
        (status = 200, description = "Ledger rows with computed due fields", body = BorrowingListResponse),
        (status = 400, description = "Unknown status")
    )
)]
pub async fn list_by_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(status): Path<String>,
) -> AppResult<Json<BorrowingListResponse>> {
    claims.require_librarian()?;

    let status: BorrowStatus = status.parse().map_err(AppError::Validation)?;
    let rows = state.services.circulation.list_by_status(status).await?;

    Ok(Json(BorrowingListResponse {
        success: true,
        data: rows,
    }))
}

/// Approve a Pending borrow request
#[utoipa::path(
    put,
    path = "/borrowings/{transaction_id}/approve",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("transaction_id" = String, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Borrowing approved", body = WorkflowResponse),
        (status = 404, description = "Pending borrowing not found")
    )
)]
pub async fn approve(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<WorkflowResponse>> {
    claims.require_librarian()?;

    state.services.circulation.approve(&transaction_id).await?;

    Ok(Json(WorkflowResponse {
        success: true,
        message: "Borrowing approved".to_string(),
    }))
}

/// Reject a Pending borrow request
#[utoipa::path(
    put,
    path = "/borrowings/{transaction_id}/reject",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("transaction_id" = String, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Borrowing rejected", body = WorkflowResponse),
        (status = 404, description = "Pending borrowing not found")
    )
)]
pub async fn reject(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<WorkflowResponse>> {
    claims.require_librarian()?;

    state.services.circulation.reject(&transaction_id).await?;

    Ok(Json(WorkflowResponse {
        success: true,
        message: "Borrowing rejected".to_string(),
    }))
}

/// Return a borrowed book. The body is optional; without one the return is
/// stamped with the current time.
#[utoipa::path(
    put,
    path = "/borrowings/{transaction_id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("transaction_id" = String, Path, description = "Transaction ID")
    ),
    request_body(content = ReturnRequest, description = "Optional return date override"),
    responses(
        (status = 200, description = "Book returned", body = WorkflowResponse),
        (status = 404, description = "Active borrowing not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<String>,
    request: Option<Json<ReturnRequest>>,
) -> AppResult<Json<WorkflowResponse>> {
    claims.require_librarian()?;

    let return_date = request.and_then(|Json(r)| r.return_date);

    state
        .services
        .circulation
        .return_book(&transaction_id, return_date)
        .await?;

    Ok(Json(WorkflowResponse {
        success: true,
        message: "Book returned".to_string(),
    }))
}
