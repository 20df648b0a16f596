//! Data models for books, borrowings, reservations and users

pub mod book;
pub mod borrowing;
pub mod reservation;
pub mod user;
