//! # Book Repository
//!
//! موجودی کتاب‌ها. تغییر `quantity` فقط با UPDATE شرطی انجام میشه تا
//! دو امانت همزمان نتونن آخرین نسخه رو دو بار بردارن.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use super::{Database, Repository};
use crate::{
    error::{AppError, Result},
    models::{Book, CreateBook},
};

/// Repository برای مدیریت کتاب‌ها
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// پیدا کردن کتاب با ID روی هر executor
    pub async fn find_book<'e, E>(executor: E, id: &str) -> Result<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, description, price, quantity,
                   availability, created_at, updated_at
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(book)
    }

    /// پیدا کردن با عنوان
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, description, price, quantity,
                   availability, created_at, updated_at
            FROM books
            WHERE title = ?
            "#,
        )
        .bind(title)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(book)
    }

    /// ایجاد کتاب جدید
    ///
    /// عنوان تکراری به `Conflict` تبدیل میشه.
    pub async fn create(&self, book: &CreateBook, now: DateTime<Utc>) -> Result<Book> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, description, price, quantity,
                               availability, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.quantity)
        .bind(book.availability())
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::from_db_conflict(e, "Book with this title already exists"))?;

        Self::find_book(self.db.pool(), &book.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create book".to_string()))
    }

    /// برداشتن یک نسخه
    ///
    /// `quantity = quantity - 1` فقط اگه `quantity > 0`. اگه ردیفی
    /// تغییر نکنه `None` برمیگرده (کتاب نیست یا موجودی صفره).
    pub async fn take_copy<'e, E>(executor: E, id: &str, now: DateTime<Utc>) -> Result<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET quantity = quantity - 1,
                availability = (quantity - 1) > 0,
                updated_at = ?
            WHERE id = ? AND quantity > 0
            RETURNING id, title, author, description, price, quantity,
                      availability, created_at, updated_at
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(book)
    }

    /// برگردوندن یک نسخه به موجودی
    pub async fn return_copy<'e, E>(executor: E, id: &str, now: DateTime<Utc>) -> Result<Option<Book>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET quantity = quantity + 1,
                availability = (quantity + 1) > 0,
                updated_at = ?
            WHERE id = ?
            RETURNING id, title, author, description, price, quantity,
                      availability, created_at, updated_at
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(book)
    }

    /// حذف کتاب
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for BookRepository {
    type Entity = Book;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        Self::find_book(self.db.pool(), id).await
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, description, price, quantity,
                   availability, created_at, updated_at
            FROM books
            ORDER BY created_at DESC, title ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(books)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateBookRequest;

    async fn seed(repo: &BookRepository, title: &str, quantity: i64) -> Book {
        let request = CreateBookRequest {
            title: title.to_string(),
            author: "Author".to_string(),
            description: "Description".to_string(),
            price: 50,
            quantity,
        };
        repo.create(&request.into(), Utc::now()).await.unwrap()
    }

    #[tokio::test]
    async fn test_take_copy_never_goes_negative() {
        let db = Database::in_memory().await.unwrap();
        let repo = BookRepository::new(db.clone());
        let book = seed(&repo, "Solaris", 1).await;

        let taken = BookRepository::take_copy(db.pool(), &book.id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken.quantity, 0);
        assert!(!taken.availability);

        let again = BookRepository::take_copy(db.pool(), &book.id, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());

        let stored = repo.find_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 0);
    }

    #[tokio::test]
    async fn test_return_copy_restores_availability() {
        let db = Database::in_memory().await.unwrap();
        let repo = BookRepository::new(db.clone());
        let book = seed(&repo, "Ubik", 0).await;
        assert!(!book.availability);

        let returned = BookRepository::return_copy(db.pool(), &book.id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(returned.quantity, 1);
        assert!(returned.availability);
    }

    #[tokio::test]
    async fn test_duplicate_title_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        let repo = BookRepository::new(db);
        seed(&repo, "Neuromancer", 1).await;

        let duplicate = CreateBookRequest {
            title: "Neuromancer".to_string(),
            author: "Someone".to_string(),
            description: "Copy".to_string(),
            price: 10,
            quantity: 1,
        };
        let err = repo.create(&duplicate.into(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
