//! Book catalog and availability endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{BookAvailability, BookQuery, BookWithStatus, CreateBook, UpdateBook},
};

use super::AuthenticatedUser;

/// Single-book response
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub success: bool,
    pub data: BookWithStatus,
}

/// Book list response
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub success: bool,
    pub data: Vec<BookWithStatus>,
}

/// Availability response
#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub data: BookAvailability,
}

/// Generic success message response
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// List books in the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Books in the catalog", body = BookListResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookListResponse>> {
    let books = state.services.catalog.list_books(query).await?;

    Ok(Json(BookListResponse {
        success: true,
        data: books.into_iter().map(Into::into).collect(),
    }))
}

/// Get a single book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.get_book(id).await?;

    Ok(Json(BookResponse {
        success: true,
        data: book.into(),
    }))
}

/// Register a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Duplicate ISBN")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    claims.require_librarian()?;

    let book = state.services.catalog.create_book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            success: true,
            data: book.into(),
        }),
    ))
}

/// Update a book (may resize total quantity)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    claims.require_librarian()?;

    let book = state.services.catalog.update_book(id, request).await?;

    Ok(Json(BookResponse {
        success: true,
        data: book.into(),
    }))
}

/// Delete a book (blocked while active borrowings exist)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Active borrowings or reservations exist")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_librarian()?;

    state.services.catalog.delete_book(id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Book deleted".to_string(),
    }))
}

/// Availability snapshot for a book
#[utoipa::path(
    get,
    path = "/books/{id}/availability",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Current availability", body = AvailabilityResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn check_availability(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AvailabilityResponse>> {
    let availability = state.services.catalog.check_availability(id).await?;

    Ok(Json(AvailabilityResponse {
        success: true,
        data: availability,
    }))
}
