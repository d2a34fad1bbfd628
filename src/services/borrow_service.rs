//! # سرویس امانت (Borrow Service)
//!
//! چرخه امانت و بازگشت کتاب.
//!
//! هر عملیات سه نوشتن وابسته داره:
//! 1. موجودی کتاب (`books.quantity`)
//! 2. دفتر شخصی کاربر (`borrowed_books`)
//! 3. دفتر کل (`borrow_records`)
//!
//! هر سه در یک تراکنش انجام میشن؛ هر خطایی وسط کار باعث rollback کامل
//! میشه و هیچ تغییر نصفه‌ای باقی نمیمونه. درخواست‌های همزمان روی یک کتاب
//! با `KeyedLocks` پشت سر هم اجرا میشن.
//!
//! تراکنش با `BEGIN IMMEDIATE` شروع میشه (`WriteTransaction`)، پس امانت‌های
//! همزمان کتاب‌های مختلف پشت قفل نوشتن SQLite صبر میکنن و `SQLITE_BUSY` نمیگیرن.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    config::Config,
    database::{
        BookRepository, BorrowRecordRepository, BorrowedBookRepository, Database, Repository,
        UserRepository, WriteTransaction,
    },
    error::{AppError, Result},
    models::{BorrowRecord, BorrowRequest, BorrowedBook, ReturnReceipt},
    utils::normalize_email,
};

use super::{calculate_fine, Clock, KeyedLocks};

#[derive(Debug, Clone)]
pub struct BorrowService {
    db: Database,
    borrowed_books: BorrowedBookRepository,
    records: BorrowRecordRepository,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks>,
    config: Arc<Config>,
}

impl BorrowService {
    #[must_use]
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self {
        Self {
            borrowed_books: BorrowedBookRepository::new(db.clone()),
            records: BorrowRecordRepository::new(db.clone()),
            db,
            clock,
            locks: Arc::new(KeyedLocks::new()),
            config,
        }
    }

    /// ثبت امانت کتاب `book_id` برای کاربر با `email`
    ///
    /// # Errors
    /// - `NotFound`: کتاب یا کاربر تایید شده پیدا نشد
    /// - `Conflict`: موجودی صفره یا کاربر این کتاب رو پس نداده
    /// - `Database`: خطای ذخیره‌سازی (هیچ تغییری اعمال نمیشه)
    #[instrument(skip(self, request))]
    pub async fn record_borrow(&self, book_id: &str, request: BorrowRequest) -> Result<BorrowRecord> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let _guard = self.locks.lock(book_id).await;
        let now = self.clock.now();

        let mut tx = self.db.begin_write().await?;
        let outcome = self.borrow_within(&mut tx, book_id, &email, now).await;
        let (record, remaining) = finish(tx, outcome).await?;

        info!(
            record_id = %record.id,
            user_id = %record.user.id,
            remaining,
            due_date = %record.due_date,
            "Book borrowed"
        );

        Ok(record)
    }

    async fn borrow_within(
        &self,
        tx: &mut WriteTransaction,
        book_id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(BorrowRecord, i64)> {
        let book = BookRepository::find_book(tx.conn()?, book_id)
            .await?
            .ok_or_else(AppError::book_not_found)?;

        let user = UserRepository::find_verified_by_email(tx.conn()?, email)
            .await?
            .ok_or_else(AppError::borrower_not_found)?;

        if !book.is_available() {
            return Err(AppError::Conflict("Book is not available to borrow".to_string()));
        }

        if BorrowedBookRepository::find_open(tx.conn()?, &user.id, &book.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User has already borrowed this book & not returned yet".to_string(),
            ));
        }

        let book = BookRepository::take_copy(tx.conn()?, &book.id, now)
            .await?
            .ok_or_else(|| AppError::Conflict("Book is not available to borrow".to_string()))?;

        let due_date = now + self.config.loan_period();

        let entry = BorrowedBook::open(&user, &book, now, due_date);
        BorrowedBookRepository::insert(tx.conn()?, &entry).await?;

        let record = BorrowRecord::open(&user, &book, now, due_date);
        BorrowRecordRepository::create(tx.conn()?, &record).await?;

        Ok((record, book.quantity))
    }

    /// ثبت بازگشت کتاب و محاسبه جریمه
    ///
    /// اگه دفتر کاربر امانت باز داشته باشه ولی دفتر کل رکورد باز نداشته
    /// باشه، `NotFound` برمیگرده و هیچ چیزی تغییر نمیکنه.
    ///
    /// # Errors
    /// - `NotFound`: کتاب، کاربر یا رکورد دفتر کل پیدا نشد
    /// - `Conflict`: کاربر این کتاب رو امانت نگرفته
    #[instrument(skip(self, request))]
    pub async fn return_borrowed_book(
        &self,
        book_id: &str,
        request: BorrowRequest,
    ) -> Result<ReturnReceipt> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let _guard = self.locks.lock(book_id).await;
        let now = self.clock.now();

        let mut tx = self.db.begin_write().await?;
        let outcome = self.return_within(&mut tx, book_id, &email, now).await;
        let receipt = finish(tx, outcome).await?;

        info!(
            record_id = %receipt.record.id,
            user_id = %receipt.record.user.id,
            fine = receipt.fine,
            "Book returned"
        );

        Ok(receipt)
    }

    async fn return_within(
        &self,
        tx: &mut WriteTransaction,
        book_id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt> {
        let book = BookRepository::find_book(tx.conn()?, book_id)
            .await?
            .ok_or_else(AppError::book_not_found)?;

        let user = UserRepository::find_verified_by_email(tx.conn()?, email)
            .await?
            .ok_or_else(AppError::borrower_not_found)?;

        let entry = BorrowedBookRepository::find_open(tx.conn()?, &user.id, &book.id)
            .await?
            .ok_or_else(|| AppError::Conflict("User has not borrowed this book yet.".to_string()))?;

        let Some(record) = BorrowRecordRepository::find_open(tx.conn()?, &book.id, email).await?
        else {
            warn!(
                entry_id = %entry.id,
                user_id = %user.id,
                "Open borrow entry has no matching ledger record"
            );
            return Err(AppError::NotFound(
                "User has not borrowed this book yet. No record found.".to_string(),
            ));
        };

        BorrowedBookRepository::mark_returned(tx.conn()?, &entry.id).await?;

        let book = BookRepository::return_copy(tx.conn()?, &book.id, now)
            .await?
            .ok_or_else(AppError::book_not_found)?;

        let fine = calculate_fine(record.due_date, now);

        let record = BorrowRecordRepository::close(tx.conn()?, &record.id, now, fine)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("User has not borrowed this book yet. No record found.".to_string())
            })?;

        ReturnReceipt::new(record, book.price)
    }

    /// تاریخچه امانت‌های کاربر
    pub async fn my_borrowed_books(&self, user_id: &str) -> Result<Vec<BorrowedBook>> {
        let entries = self.borrowed_books.find_by_user(user_id).await?;

        if entries.is_empty() {
            return Err(AppError::NotFound("No borrowed books found".to_string()));
        }

        Ok(entries)
    }

    /// کل دفتر امانت (ادمین)
    pub async fn all_borrow_records(&self) -> Result<Vec<BorrowRecord>> {
        self.records.find_all().await
    }
}

/// commit در صورت موفقیت، rollback در غیر این صورت
async fn finish<T>(tx: WriteTransaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{BookRepository, UserRepository},
        models::{Book, CreateBookRequest, CreateUser, Role},
        services::FixedClock,
    };
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    struct Fixture {
        db: Database,
        clock: Arc<FixedClock>,
        service: BorrowService,
        book: Book,
    }

    async fn fixture(quantity: i64) -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));

        UserRepository::new(db.clone())
            .create(
                &CreateUser::new("Reader", "reader@example.com", "password123", Role::User)
                    .unwrap()
                    .verified(),
                start,
            )
            .await
            .unwrap();

        let book = BookRepository::new(db.clone())
            .create(
                &CreateBookRequest {
                    title: "Dune".to_string(),
                    author: "Frank Herbert".to_string(),
                    description: "Spice".to_string(),
                    price: 100,
                    quantity,
                }
                .into(),
                start,
            )
            .await
            .unwrap();

        let service = BorrowService::new(db.clone(), clock.clone(), Arc::new(Config::default()));

        Fixture {
            db,
            clock,
            service,
            book,
        }
    }

    fn request() -> BorrowRequest {
        BorrowRequest {
            email: " Reader@Example.com ".to_string(),
        }
    }

    #[tokio::test]
    async fn test_borrow_sets_due_date_and_decrements() {
        let f = fixture(2).await;
        let now = f.clock.now();

        let record = f.service.record_borrow(&f.book.id, request()).await.unwrap();

        assert_eq!(record.due_date, now + Duration::days(7));
        assert_eq!(record.price, 100);
        assert_eq!(record.user.email, "reader@example.com");

        let book = BookRepository::new(f.db.clone()).find_by_id(&f.book.id).await.unwrap().unwrap();
        assert_eq!(book.quantity, 1);
        assert!(book.availability);
    }

    #[tokio::test]
    async fn test_duplicate_borrow_is_conflict_without_side_effects() {
        let f = fixture(2).await;
        f.service.record_borrow(&f.book.id, request()).await.unwrap();

        let err = f.service.record_borrow(&f.book.id, request()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let book = BookRepository::new(f.db.clone()).find_by_id(&f.book.id).await.unwrap().unwrap();
        assert_eq!(book.quantity, 1);
        assert_eq!(f.service.all_borrow_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_book_and_user() {
        let f = fixture(1).await;

        let err = f.service.record_borrow("missing", request()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Book not found"));

        let err = f
            .service
            .record_borrow(
                &f.book.id,
                BorrowRequest {
                    email: "nobody@example.com".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_late_return_charges_started_hours() {
        let f = fixture(1).await;
        f.service.record_borrow(&f.book.id, request()).await.unwrap();

        f.clock.advance(Duration::days(7) + Duration::minutes(61));
        let receipt = f.service.return_borrowed_book(&f.book.id, request()).await.unwrap();

        assert_eq!(receipt.fine, 20);
        assert_eq!(receipt.total_charge, 120);
        assert_eq!(receipt.record.fine, 20);
        assert!(!receipt.record.is_open());
    }

    #[tokio::test]
    async fn test_return_without_borrow_is_conflict() {
        let f = fixture(1).await;

        let err = f
            .service
            .return_borrowed_book(&f.book.id, request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_history_is_not_found_when_empty() {
        let f = fixture(1).await;
        let user = UserRepository::find_by_email(f.db.pool(), "reader@example.com")
            .await
            .unwrap()
            .unwrap();

        let err = f.service.my_borrowed_books(&user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        f.service.record_borrow(&f.book.id, request()).await.unwrap();
        assert_eq!(f.service.my_borrowed_books(&user.id).await.unwrap().len(), 1);
    }
}
