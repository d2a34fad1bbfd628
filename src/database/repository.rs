//! # Repository Pattern
//!
//! یه لایه انتزاعی بین منطق برنامه و دیتابیس.
//!
//! ## دو شکل متد
//! - متدهای `&self`: روی pool اجرا میشن (خوندن‌های ساده، CRUD ادمین)
//! - توابع associated با پارامتر `executor`: هر `sqlx::Executor` رو قبول
//!   میکنن، پس هم با `&SqlitePool` و هم با `&mut *tx` داخل یک تراکنش کار میکنن.
//!   عملیات امانت و بازگشت فقط از این‌ها استفاده میکنن.

use async_trait::async_trait;

use crate::error::Result;

// =====================================
// Base Repository Trait
// =====================================
/// Trait پایه برای Repository‌ها
#[async_trait]
pub trait Repository: Send + Sync {
    /// نوع Entity که این repository باهاش کار میکنه
    type Entity: Send + Sync;

    /// نوع شناسه (ID)
    type Id: Send + Sync + ?Sized;

    /// پیدا کردن با ID
    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;

    /// پیدا کردن همه
    async fn find_all(&self) -> Result<Vec<Self::Entity>>;

    /// شمارش کل
    async fn count(&self) -> Result<i64>;
}
