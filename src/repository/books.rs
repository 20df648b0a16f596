//! Books repository: the inventory store
//!
//! `available_quantity` only moves through the adjustment primitives below,
//! always inside the caller's transaction, so a ledger write and its
//! inventory effect commit or roll back together.

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::{resized_available, Book, BookAvailability, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Availability snapshot for a single title
    pub async fn check_availability(&self, id: i32) -> AppResult<BookAvailability> {
        sqlx::query_as::<_, BookAvailability>(
            "SELECT title, quantity, available_quantity FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with optional filters
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR author ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR isbn = $4)
            ORDER BY title
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(&query.title)
        .bind(&query.author)
        .bind(&query.category)
        .bind(&query.isbn)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Register a new title. All copies start on the shelf.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, category, isbn, quantity, available_quantity)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("A book with ISBN {} already exists", book.isbn))
            }
            _ => AppError::from(e),
        })?;

        Ok(created)
    }

    /// Update a title. Resizing `quantity` shifts `available_quantity` by the
    /// same delta, clamped to `[0, quantity]`; the row is locked so a
    /// concurrent circulation transition cannot interleave with the resize.
    pub async fn update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
        update: &UpdateBook,
    ) -> AppResult<Book> {
        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let new_quantity = update.quantity.unwrap_or(current.quantity);
        let new_available =
            resized_available(current.quantity, current.available_quantity, new_quantity);

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, category = $3, isbn = $4,
                quantity = $5, available_quantity = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(update.title.as_ref().unwrap_or(&current.title))
        .bind(update.author.as_ref().unwrap_or(&current.author))
        .bind(update.category.as_ref().or(current.category.as_ref()))
        .bind(update.isbn.as_ref().unwrap_or(&current.isbn))
        .bind(new_quantity)
        .bind(new_available)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(updated)
    }

    /// Delete a title
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Lock the book row and return its current counts. Every
    /// check-then-decrement sequence starts here so two concurrent requests
    /// cannot both observe the same stale availability.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<BookAvailability> {
        sqlx::query_as::<_, BookAvailability>(
            "SELECT title, quantity, available_quantity FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Take one copy off the shelf, clamped at zero. Used by the approval
    /// path, where the Pending request never reserved the copy: exhausted
    /// availability clamps rather than failing.
    pub async fn decrement_available(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<i16> {
        let available = sqlx::query_scalar::<_, i16>(
            r#"
            UPDATE books
            SET available_quantity = GREATEST(0, available_quantity - 1), updated_at = NOW()
            WHERE id = $1
            RETURNING available_quantity
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(available)
    }

    /// Take one copy off the shelf, failing when none remain. Callers must
    /// hold the row lock (`lock_for_update`) for the check to be meaningful.
    pub async fn decrement_available_strict(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<i16> {
        let locked = self.lock_for_update(tx, id).await?;

        if locked.available_quantity <= 0 {
            return Err(AppError::InsufficientCopies(format!(
                "All {} copies of \"{}\" are currently borrowed",
                locked.quantity, locked.title
            )));
        }

        self.decrement_available(tx, id).await
    }

    /// Put one copy back on the shelf, capped at the total owned
    pub async fn increment_available(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<i16> {
        let available = sqlx::query_scalar::<_, i16>(
            r#"
            UPDATE books
            SET available_quantity = LEAST(quantity, available_quantity + 1), updated_at = NOW()
            WHERE id = $1
            RETURNING available_quantity
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(available)
    }
}
