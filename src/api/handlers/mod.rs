//! # HTTP Handlers
//!
//! هر handler فقط ورودی رو استخراج میکنه، سرویس رو صدا میزنه و
//! نتیجه رو در `ApiResponse` میپیچه. منطق کسب‌وکار در `services` هست.

pub mod auth;
pub mod book;
pub mod borrow;
pub mod health;
pub mod user;
