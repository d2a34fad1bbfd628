//! # ماژول سرویس‌ها (Business Logic Layer)
//!
//! این ماژول منطق کسب‌وکار برنامه رو پیاده‌سازی میکنه.
//!
//! ## لایه‌بندی معماری
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- امانت، بازگشت، جریمه، احراز هویت
//! ├─────────────────┤
//! │ Repository Layer│  <-- Data access
//! ├─────────────────┤
//! │    Database     │  <-- SQLite
//! └─────────────────┘
//! ```
//!
//! `jobs` هم از همین لایه (repositories، `Clock`، `Mailer`) استفاده میکنه.

mod auth_service;
mod book_service;
mod borrow_service;
mod clock;
mod fine;
mod locks;
mod mailer;

pub use auth_service::*;
pub use book_service::*;
pub use borrow_service::*;
pub use clock::*;
pub use fine::*;
pub use locks::*;
pub use mailer::*;

use std::sync::Arc;

use crate::{
    config::Config,
    database::{BookRepository, Database, UserRepository},
};

// =====================================
// Application State
// =====================================
/// وضعیت برنامه که بین همه handlers و jobs اشتراک‌گذاری میشه
///
/// clone کردنش فقط Arc‌ها رو clone میکنه.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,

    pub book_service: Arc<BookService>,
    pub borrow_service: Arc<BorrowService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// ساخت AppState با ساعت سیستم و `LogMailer`
    #[must_use]
    pub fn new(db: Database, config: Config) -> Self {
        Self::with_collaborators(db, config, Arc::new(SystemClock), Arc::new(LogMailer))
    }

    /// ساخت AppState با ساعت و mailer دلخواه (تست‌ها)
    #[must_use]
    pub fn with_collaborators(
        db: Database,
        config: Config,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let config = Arc::new(config);

        let book_service = Arc::new(BookService::new(BookRepository::new(db.clone()), clock.clone()));

        let borrow_service = Arc::new(BorrowService::new(db.clone(), clock.clone(), config.clone()));

        let auth_service = Arc::new(AuthService::new(
            UserRepository::new(db.clone()),
            config.clone(),
            clock.clone(),
            mailer.clone(),
        ));

        Self {
            config,
            db,
            clock,
            mailer,
            book_service,
            borrow_service,
            auth_service,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

