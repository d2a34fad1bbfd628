//! # Library Service
//!
//! بک‌اند مدیریت کتابخانه: موجودی کتاب‌ها، امانت و بازگشت با جریمه دیرکرد،
//! یادآوری ایمیلی دوره‌ای و پاکسازی حساب‌های تایید نشده.
//!
//! ## ساختار پروژه
//!
//! ```text
//! src/
//! ├── lib.rs          # نقطه ورود کتابخانه
//! ├── main.rs         # نقطه ورود باینری
//! ├── config/         # مدیریت تنظیمات
//! ├── error/          # تعریف خطاها
//! ├── database/       # لایه دیتابیس و repository‌ها
//! ├── models/         # مدل‌های داده
//! ├── services/       # منطق کسب‌وکار (امانت، جریمه، احراز هویت)
//! ├── jobs/           # sweep‌های دوره‌ای
//! ├── api/            # لایه HTTP
//! └── utils/          # توابع کمکی
//! ```
//!
//! ## مثال استفاده
//!
//! ```rust,no_run
//! use library_service::{config::Config, database::Database, services::AppState};
//!
//! #[tokio::main]
//! async fn main() -> library_service::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!     let _state = AppState::new(db, config);
//!     Ok(())
//! }
//! ```

// =====================================
// Module Declarations
// =====================================
/// ماژول مدیریت تنظیمات برنامه
pub mod config;

/// ماژول تعریف و مدیریت خطاها
pub mod error;

/// ماژول ارتباط با دیتابیس
pub mod database;

/// ماژول مدل‌های داده (Domain Models)
pub mod models;

/// ماژول سرویس‌ها (Business Logic)
pub mod services;

/// sweep‌های زمان‌بندی شده
pub mod jobs;

/// ماژول API و HTTP Handlers
pub mod api;

/// ماژول توابع کمکی
pub mod utils;

// =====================================
// Re-exports
// =====================================
pub use error::{AppError, Result};

// =====================================
// Prelude Module
// =====================================
/// ماژول prelude برای import راحت‌تر آیتم‌های پرکاربرد
///
/// ```rust
/// use library_service::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::Database;
    pub use crate::error::{AppError, Result};
    pub use crate::jobs::{Scheduler, Sweep, SweepReport};
    pub use crate::models::*;
    pub use crate::services::*;
}
