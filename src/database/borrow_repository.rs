//! # Borrow Repositories
//!
//! دو دفتر امانت:
//! - `BorrowedBookRepository`: دفتر شخصی هر کاربر (`borrowed_books`)
//! - `BorrowRecordRepository`: دفتر کل (`borrow_records`)
//!
//! هر دو فقط append و update دارن، حذف ندارن.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use super::{Database, Repository};
use crate::{
    error::{AppError, Result},
    models::{BorrowRecord, BorrowedBook},
};

// =====================================
// User Sub-Ledger
// =====================================
#[derive(Debug, Clone)]
pub struct BorrowedBookRepository {
    db: Database,
}

impl BorrowedBookRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// امانت باز کاربر برای یک کتاب
    pub async fn find_open<'e, E>(
        executor: E,
        user_id: &str,
        book_id: &str,
    ) -> Result<Option<BorrowedBook>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let entry = sqlx::query_as::<_, BorrowedBook>(
            r#"
            SELECT id, user_id, book_id, book_title, borrow_date, due_date, returned
            FROM borrowed_books
            WHERE user_id = ? AND book_id = ? AND returned = 0
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(executor)
        .await?;

        Ok(entry)
    }

    /// اضافه کردن امانت جدید
    ///
    /// ایندکس یکتای `(user_id, book_id) WHERE returned = 0` امانت باز
    /// دوم رو رد میکنه و به `Conflict` تبدیل میشه.
    pub async fn insert<'e, E>(executor: E, entry: &BorrowedBook) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO borrowed_books (id, user_id, book_id, book_title,
                                        borrow_date, due_date, returned)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.book_id)
        .bind(&entry.book_title)
        .bind(entry.borrow_date)
        .bind(entry.due_date)
        .bind(entry.returned)
        .execute(executor)
        .await
        .map_err(|e| {
            AppError::from_db_conflict(e, "User has already borrowed this book & not returned yet")
        })?;

        Ok(())
    }

    /// بستن امانت باز
    pub async fn mark_returned<'e, E>(executor: E, id: &str) -> Result<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE borrowed_books SET returned = 1 WHERE id = ? AND returned = 0",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// کل تاریخچه امانت یک کاربر (باز و بسته)
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<BorrowedBook>> {
        let entries = sqlx::query_as::<_, BorrowedBook>(
            r#"
            SELECT id, user_id, book_id, book_title, borrow_date, due_date, returned
            FROM borrowed_books
            WHERE user_id = ?
            ORDER BY borrow_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(entries)
    }
}

// =====================================
// Ledger
// =====================================
#[derive(Debug, Clone)]
pub struct BorrowRecordRepository {
    db: Database,
}

const RECORD_COLUMNS: &str = "id, user_id, user_name, user_email, book_id, price, borrow_date, \
     due_date, return_date, fine, notified, created_at, updated_at";

impl BorrowRecordRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// ثبت رکورد جدید در دفتر کل
    pub async fn create<'e, E>(executor: E, record: &BorrowRecord) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO borrow_records (id, user_id, user_name, user_email, book_id, price,
                                        borrow_date, due_date, return_date, fine, notified,
                                        created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user.id)
        .bind(&record.user.name)
        .bind(&record.user.email)
        .bind(&record.book_id)
        .bind(record.price)
        .bind(record.borrow_date)
        .bind(record.due_date)
        .bind(record.return_date)
        .bind(record.fine)
        .bind(record.notified)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// رکورد باز برای (کتاب، email)
    ///
    /// اگه به هر دلیلی چندتا باشه، قدیمی‌ترین انتخاب میشه.
    pub async fn find_open<'e, E>(
        executor: E,
        book_id: &str,
        email: &str,
    ) -> Result<Option<BorrowRecord>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM borrow_records \
             WHERE book_id = ? AND user_email = ? AND return_date IS NULL \
             ORDER BY borrow_date ASC LIMIT 1"
        );

        let record = sqlx::query_as::<_, BorrowRecord>(&sql)
            .bind(book_id)
            .bind(email)
            .fetch_optional(executor)
            .await?;

        Ok(record)
    }

    /// بستن رکورد با تاریخ بازگشت و جریمه
    ///
    /// فقط رکورد باز تغییر میکنه؛ رکورد بسته شده `None` برمیگردونه.
    pub async fn close<'e, E>(
        executor: E,
        id: &str,
        return_date: DateTime<Utc>,
        fine: i64,
    ) -> Result<Option<BorrowRecord>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE borrow_records SET return_date = ?, fine = ?, updated_at = ? \
             WHERE id = ? AND return_date IS NULL \
             RETURNING {RECORD_COLUMNS}"
        );

        let record = sqlx::query_as::<_, BorrowRecord>(&sql)
            .bind(return_date)
            .bind(fine)
            .bind(return_date)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(record)
    }

    /// رکوردهای باز و یادآوری نشده با سررسید قبل از `cutoff`
    pub async fn find_overdue_unnotified(&self, cutoff: DateTime<Utc>) -> Result<Vec<BorrowRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM borrow_records \
             WHERE due_date < ? AND return_date IS NULL AND notified = 0 \
             ORDER BY due_date ASC"
        );

        let records = sqlx::query_as::<_, BorrowRecord>(&sql)
            .bind(cutoff)
            .fetch_all(self.db.pool())
            .await?;

        Ok(records)
    }

    /// علامت‌گذاری یادآوری ارسال شده
    pub async fn mark_notified(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE borrow_records SET notified = 1, updated_at = ? WHERE id = ? AND notified = 0",
        )
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for BorrowRecordRepository {
    type Entity = BorrowRecord;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<BorrowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM borrow_records WHERE id = ?");

        let record = sqlx::query_as::<_, BorrowRecord>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<BorrowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM borrow_records ORDER BY borrow_date DESC");

        let records = sqlx::query_as::<_, BorrowRecord>(&sql)
            .fetch_all(self.db.pool())
            .await?;

        Ok(records)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM borrow_records")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{BookRepository, UserRepository},
        models::{Book, CreateBookRequest, CreateUser, Role, User},
    };
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    async fn seed(db: &Database) -> (User, Book) {
        let user = UserRepository::new(db.clone())
            .create(
                &CreateUser::new("Reader", "reader@example.com", "password123", Role::User)
                    .unwrap()
                    .verified(),
                at(0),
            )
            .await
            .unwrap();

        let request = CreateBookRequest {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: "Spice".to_string(),
            price: 100,
            quantity: 2,
        };
        let book = BookRepository::new(db.clone())
            .create(&request.into(), at(0))
            .await
            .unwrap();

        (user, book)
    }

    #[tokio::test]
    async fn test_second_open_entry_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        let (user, book) = seed(&db).await;
        let due = at(1) + Duration::days(7);

        BorrowedBookRepository::insert(db.pool(), &BorrowedBook::open(&user, &book, at(1), due))
            .await
            .unwrap();

        let err = BorrowedBookRepository::insert(
            db.pool(),
            &BorrowedBook::open(&user, &book, at(2), due),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_returned_entry_allows_new_borrow() {
        let db = Database::in_memory().await.unwrap();
        let (user, book) = seed(&db).await;
        let due = at(1) + Duration::days(7);

        let first = BorrowedBook::open(&user, &book, at(1), due);
        BorrowedBookRepository::insert(db.pool(), &first).await.unwrap();
        assert!(BorrowedBookRepository::mark_returned(db.pool(), &first.id).await.unwrap());
        assert!(!BorrowedBookRepository::mark_returned(db.pool(), &first.id).await.unwrap());

        BorrowedBookRepository::insert(db.pool(), &BorrowedBook::open(&user, &book, at(3), due))
            .await
            .unwrap();

        let history = BorrowedBookRepository::new(db.clone())
            .find_by_user(&user.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|e| !e.returned).count(), 1);
    }

    #[tokio::test]
    async fn test_record_closes_once() {
        let db = Database::in_memory().await.unwrap();
        let (user, book) = seed(&db).await;
        let record = BorrowRecord::open(&user, &book, at(1), at(1) + Duration::days(7));
        BorrowRecordRepository::create(db.pool(), &record).await.unwrap();

        let open = BorrowRecordRepository::find_open(db.pool(), &book.id, &user.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.id, record.id);
        assert_eq!(open.user.email, "reader@example.com");

        let closed = BorrowRecordRepository::close(db.pool(), &record.id, at(5), 30)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.return_date, Some(at(5)));
        assert_eq!(closed.fine, 30);

        assert!(BorrowRecordRepository::close(db.pool(), &record.id, at(6), 0)
            .await
            .unwrap()
            .is_none());
        assert!(BorrowRecordRepository::find_open(db.pool(), &book.id, &user.email)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_overdue_selection_skips_notified_and_returned() {
        let db = Database::in_memory().await.unwrap();
        let (user, book) = seed(&db).await;
        let repo = BorrowRecordRepository::new(db.clone());

        let overdue = BorrowRecord::open(&user, &book, at(0), at(1));
        let notified = BorrowRecord::open(&user, &book, at(0), at(1));
        let returned = BorrowRecord::open(&user, &book, at(0), at(1));
        let not_due = BorrowRecord::open(&user, &book, at(0), at(20));

        for record in [&overdue, &notified, &returned, &not_due] {
            BorrowRecordRepository::create(db.pool(), record).await.unwrap();
        }
        assert!(repo.mark_notified(&notified.id, at(2)).await.unwrap());
        BorrowRecordRepository::close(db.pool(), &returned.id, at(2), 0)
            .await
            .unwrap();

        let selected = repo.find_overdue_unnotified(at(10)).await.unwrap();
        let ids: Vec<_> = selected.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![overdue.id.as_str()]);
        assert_eq!(repo.count().await.unwrap(), 4);
    }
}
