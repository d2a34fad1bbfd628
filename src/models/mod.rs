//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده برنامه رو تعریف میکنه.
//!
//! ## تفاوت انواع مدل:
//! - **Entity**: داده‌ای که در دیتابیس ذخیره میشه (`Book`, `User`, `BorrowRecord`)
//! - **DTO**: برای ارسال/دریافت از API (`CreateBookRequest`, `ReturnReceipt`)
//!
//! ## دو دفتر امانت
//! هر رویداد امانت دو ردیف میسازه:
//! - `BorrowedBook`: دفتر شخصی کاربر برای «کتاب‌های من»
//! - `BorrowRecord`: دفتر کل برای ادمین و تاریخچه جریمه
//!
//! این دو در یک تراکنش نوشته میشن و constraint دیتابیسی بینشون نیست.

mod book;
mod borrow;
mod dto;
mod user;

pub use book::*;
pub use borrow::*;
pub use dto::*;
pub use user::*;

use serde::{Deserialize, Serialize};

// =====================================
// Common Types (Newtype Pattern)
// =====================================
/// شناسه یکتا
///
/// # مثال
/// ```rust
/// use library_service::models::Id;
///
/// let id = Id::new();
/// assert_eq!(id.as_str().len(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// ساخت ID جدید با nanoid
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!(21))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
