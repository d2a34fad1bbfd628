//! # سرویس کتاب (Book Service)
//!
//! مدیریت موجودی کتاب‌ها توسط ادمین و نمایش به کاربران

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::{
    database::{BookRepository, Repository},
    error::{AppError, OptionExt, Result},
    models::{Book, CreateBook, CreateBookRequest},
};

use super::Clock;

#[derive(Debug, Clone)]
pub struct BookService {
    repo: BookRepository,
    clock: Arc<dyn Clock>,
}

impl BookService {
    #[must_use]
    pub fn new(repo: BookRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// افزودن کتاب جدید
    ///
    /// # Errors
    /// - `Validation`: فیلد خالی یا عدد منفی
    /// - `Conflict`: عنوان تکراری
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn add_book(&self, request: CreateBookRequest) -> Result<Book> {
        request.validate()?;

        let create = CreateBook::from(request);
        if create.title.is_empty() || create.author.is_empty() || create.description.is_empty() {
            return Err(AppError::Validation(
                "Please fill all the required fields".to_string(),
            ));
        }

        let book = self.repo.create(&create, self.clock.now()).await?;

        info!(book_id = %book.id, quantity = book.quantity, "Book added");
        Ok(book)
    }

    /// لیست همه کتاب‌ها
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let books = self.repo.find_all().await?;

        if books.is_empty() {
            return Err(AppError::NotFound("No books found to display.".to_string()));
        }

        Ok(books)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book> {
        self.repo.find_by_id(id).await?.ok_or_not_found("Book not found")
    }

    /// حذف کتاب
    ///
    /// رکوردهای امانت قبلی دست نمیخورن.
    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Book not found to delete.".to_string()));
        }

        info!(book_id = %id, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{database::Database, services::SystemClock};

    async fn service() -> BookService {
        let db = Database::in_memory().await.unwrap();
        BookService::new(BookRepository::new(db), Arc::new(SystemClock))
    }

    fn request(title: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: title.to_string(),
            author: "Ursula K. Le Guin".to_string(),
            description: "Anarres".to_string(),
            price: 80,
            quantity: 3,
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let service = service().await;
        let err = service.list_books().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_then_delete() {
        let service = service().await;
        let book = service.add_book(request("The Dispossessed")).await.unwrap();
        assert!(book.availability);
        assert_eq!(service.list_books().await.unwrap().len(), 1);

        service.delete_book(&book.id).await.unwrap();
        let err = service.delete_book(&book.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let service = service().await;
        let err = service.add_book(request("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
