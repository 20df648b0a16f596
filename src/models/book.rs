//! Book (inventory) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Derived availability label. Never stored: computed from
/// `available_quantity > 0` at serialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl BookStatus {
    pub fn from_available(available_quantity: i16) -> Self {
        if available_quantity > 0 {
            BookStatus::Available
        } else {
            BookStatus::NotAvailable
        }
    }
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub isbn: String,
    pub quantity: i16,
    pub available_quantity: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn status(&self) -> BookStatus {
        BookStatus::from_available(self.available_quantity)
    }
}

/// Book with its derived status for API responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookWithStatus {
    #[serde(flatten)]
    pub book: Book,
    pub status: BookStatus,
}

impl From<Book> for BookWithStatus {
    fn from(book: Book) -> Self {
        let status = book.status();
        Self { book, status }
    }
}

/// Availability snapshot for a single title
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookAvailability {
    pub title: String,
    pub quantity: i16,
    pub available_quantity: i16,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    pub category: Option<String>,
    #[validate(length(min = 1, message = "isbn is required"))]
    pub isbn: String,
    #[validate(range(min = 0))]
    pub quantity: i16,
}

/// Update book request. A `quantity` resize shifts `available_quantity`
/// by the same delta, clamped to `[0, quantity]`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i16>,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Compute the new `available_quantity` after a librarian resizes a book's
/// total `quantity`. Copies currently out on loan stay out: the available
/// count moves by the same delta as the total, clamped to `[0, new_quantity]`.
pub fn resized_available(old_quantity: i16, old_available: i16, new_quantity: i16) -> i16 {
    let delta = new_quantity - old_quantity;
    (old_available + delta).clamp(0, new_quantity)
}
