//! Catalog (book inventory) service

use validator::Validate;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookAvailability, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CirculationConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new title
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.books.create(&book).await
    }

    /// Get a title by id
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List titles with optional filters
    pub async fn list_books(&self, query: BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(&query).await
    }

    /// Update a title. Quantity resizes go through a transaction so they
    /// cannot interleave with a circulation transition on the same row.
    pub async fn update_book(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut tx = self
            .repository
            .begin(self.config.statement_timeout_secs)
            .await?;
        let book = self.repository.books.update(&mut tx, id, &update).await?;
        tx.commit().await?;
        Ok(book)
    }

    /// Delete a title. Active borrowings or reservations block the delete
    /// with a conflict; settled ledger history (Returned rows, terminal
    /// reservations) goes with the title.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        // Surface NotFound before the active-rows checks
        self.repository.books.get_by_id(id).await?;

        if self.repository.borrowings.has_active_for_book(id).await? {
            return Err(AppError::Conflict(
                "Book has active borrowings and cannot be deleted".to_string(),
            ));
        }

        if self.repository.reservations.has_active_for_book(id).await? {
            return Err(AppError::Conflict(
                "Book has active reservations and cannot be deleted".to_string(),
            ));
        }

        self.repository.books.delete(id).await
    }

    /// Availability snapshot for a title
    pub async fn check_availability(&self, id: i32) -> AppResult<BookAvailability> {
        self.repository.books.check_availability(id).await
    }
}
