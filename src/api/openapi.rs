//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowings, health, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblion API",
        version = "1.0.0",
        description = "Library Circulation Server REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::check_availability,
        // Borrowings
        borrowings::submit_borrow,
        borrowings::direct_issue,
        borrowings::list_by_status,
        borrowings::approve,
        borrowings::reject,
        borrowings::return_book,
        // Reservations
        reservations::create_reservation,
        reservations::list_user_reservations,
        reservations::set_reservation_status,
        reservations::cancel_reservation,
        reservations::mark_expired,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookWithStatus,
            crate::models::book::BookStatus,
            crate::models::book::BookAvailability,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookResponse,
            books::BookListResponse,
            books::AvailabilityResponse,
            books::MessageResponse,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowStatus,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::SubmitBorrow,
            crate::models::borrowing::BorrowOutcome,
            crate::models::borrowing::BorrowedBookInfo,
            borrowings::BorrowResponse,
            borrowings::BorrowingListResponse,
            borrowings::WorkflowResponse,
            borrowings::ReturnRequest,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::CreateReservation,
            reservations::ReservationResponse,
            reservations::ReservationListResponse,
            reservations::SetStatusRequest,
            reservations::TransitionResponse,
            reservations::CancelRequest,
            reservations::MarkExpiredResponse,
            // Users
            crate::models::user::BorrowerRole,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog and inventory"),
        (name = "borrowings", description = "Borrow, approval and return workflows"),
        (name = "reservations", description = "Reservation workflows")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
