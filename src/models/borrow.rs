//! # مدل امانت (Borrow Models)
//!
//! - `BorrowedBook`: یک ردیف از دفتر شخصی کاربر
//! - `BorrowRecord`: یک ردیف از دفتر کل، مستقل از کاربر قابل دسترسی
//! - `ReturnReceipt`: نتیجه بازگشت کتاب همراه با جریمه و مبلغ کل

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Book, Id, User};
use crate::{
    error::{AppError, Result},
    utils::format_charge,
};

// =====================================
// User Sub-Ledger Entry
// =====================================
/// یک امانت در دفتر شخصی کاربر
///
/// ردیف‌ها حذف نمیشن، فقط `returned` روشن میشه.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BorrowedBook {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub book_title: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
}

impl BorrowedBook {
    /// ساخت ردیف باز برای یک رویداد امانت
    #[must_use]
    pub fn open(user: &User, book: &Book, borrow_date: DateTime<Utc>, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Id::new().into_string(),
            user_id: user.id.clone(),
            book_id: book.id.clone(),
            book_title: book.title.clone(),
            borrow_date,
            due_date,
            returned: false,
        }
    }
}

// =====================================
// Ledger Record
// =====================================
/// تصویر کاربر در لحظه امانت
///
/// بعدا با تغییر پروفایل کاربر به‌روز نمیشه.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BorrowerSnapshot {
    #[sqlx(rename = "user_id")]
    pub id: String,

    #[sqlx(rename = "user_name")]
    pub name: String,

    #[sqlx(rename = "user_email")]
    pub email: String,
}

/// رکورد دفتر کل امانت
///
/// یک بار موقع امانت ساخته میشه، یک بار موقع بازگشت تغییر میکنه
/// (`return_date` و `fine`) و هیچوقت حذف نمیشه.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BorrowRecord {
    pub id: String,

    #[sqlx(flatten)]
    pub user: BorrowerSnapshot,

    pub book_id: String,

    /// قیمت کتاب در لحظه امانت
    pub price: i64,

    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine: i64,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowRecord {
    #[must_use]
    pub fn open(user: &User, book: &Book, borrow_date: DateTime<Utc>, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Id::new().into_string(),
            user: BorrowerSnapshot {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
            },
            book_id: book.id.clone(),
            price: book.price,
            borrow_date,
            due_date,
            return_date: None,
            fine: 0,
            notified: false,
            created_at: borrow_date,
            updated_at: borrow_date,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

// =====================================
// API DTOs
// =====================================
/// بدنه درخواست امانت/بازگشت
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BorrowRequest {
    #[validate(email(message = "Email is required"))]
    pub email: String,
}

/// نتیجه بازگشت کتاب
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub record: BorrowRecord,

    /// قیمت فعلی کتاب
    pub book_price: i64,

    pub fine: i64,

    /// `book_price + fine`
    pub total_charge: i64,

    pub message: String,
}

impl ReturnReceipt {
    /// # Errors
    /// `Internal` اگه جمع قیمت و جریمه سرریز کنه
    pub fn new(record: BorrowRecord, book_price: i64) -> Result<Self> {
        let fine = record.fine;
        let total_charge = book_price
            .checked_add(fine)
            .ok_or_else(|| AppError::Internal("Total charge overflow".to_string()))?;

        let message = if fine != 0 {
            format!(
                "Book returned successfully. The total charges including fine are: {}. The fine is: {}",
                format_charge(total_charge),
                format_charge(fine)
            )
        } else {
            format!(
                "Book returned successfully. The total charges are: {}",
                format_charge(book_price)
            )
        };

        Ok(Self {
            record,
            book_price,
            fine,
            total_charge,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(fine: i64) -> BorrowRecord {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        BorrowRecord {
            id: "rec".to_string(),
            user: BorrowerSnapshot {
                id: "u1".to_string(),
                name: "Ali".to_string(),
                email: "ali@example.com".to_string(),
            },
            book_id: "b1".to_string(),
            price: 100,
            borrow_date: at,
            due_date: at + chrono::Duration::days(7),
            return_date: Some(at),
            fine,
            notified: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_receipt_with_fine_reports_total() {
        let receipt = ReturnReceipt::new(record(20), 100).unwrap();

        assert_eq!(receipt.total_charge, 120);
        assert!(receipt.message.contains("Rs. 120"));
        assert!(receipt.message.contains("The fine is: Rs. 20"));
    }

    #[test]
    fn test_receipt_without_fine_reports_price() {
        let receipt = ReturnReceipt::new(record(0), 100).unwrap();

        assert_eq!(receipt.total_charge, 100);
        assert!(receipt.message.ends_with("Rs. 100"));
        assert!(!receipt.message.contains("fine"));
    }

    #[test]
    fn test_receipt_total_overflow_is_an_error() {
        let err = ReturnReceipt::new(record(20), i64::MAX).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
