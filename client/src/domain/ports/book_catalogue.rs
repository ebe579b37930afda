//! Port for the book catalogue collection.

use async_trait::async_trait;

use crate::domain::{Book, BookDraft, BookId};

use super::GatewayError;

/// Catalogue reads and staff-only writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalogue: Send + Sync {
    /// Every book.
    async fn list_books(&self) -> Result<Vec<Book>, GatewayError>;

    /// Books whose title, author, or ISBN contains `keyword`.
    async fn search_books(&self, keyword: &str) -> Result<Vec<Book>, GatewayError>;

    /// Books shelved under `category`.
    async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, GatewayError>;

    /// One book.
    async fn find_book(&self, id: BookId) -> Result<Book, GatewayError>;

    /// Add a book; the backend assigns the id.
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, GatewayError>;

    /// Replace a book's details.
    async fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book, GatewayError>;

    /// Remove a book.
    async fn delete_book(&self, id: BookId) -> Result<(), GatewayError>;
}
