//! # ارسال ایمیل (Mailer)
//!
//! هسته فقط trait `Mailer` رو میشناسه. پیاده‌سازی پیش‌فرض (`LogMailer`)
//! پیام رو با tracing ثبت میکنه؛ transport واقعی (SMTP و ...) بیرون از
//! این crate پیاده‌سازی میشه.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::Result, utils::mask_email};

/// متن ثابت ایمیل یادآوری
pub const REMINDER_MESSAGE: &str = "This is a reminder that the book you borrowed is due in 24 hours. \
Kindly request you to return the book to Library Management System before due date.\n\n\
Thanks,\nLibrary Management System";

pub const REMINDER_SUBJECT: &str = "Book Return Reminder | Library Management System";

pub const VERIFICATION_SUBJECT: &str = "Email Verification Code | Library Management System";

// =====================================
// Email Message
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// ایمیل یادآوری بازگشت کتاب
    #[must_use]
    pub fn reminder(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            to_name: name.into(),
            to_email: email.into(),
            subject: REMINDER_SUBJECT.to_string(),
            body: REMINDER_MESSAGE.to_string(),
        }
    }

    /// ایمیل کد تایید حساب
    #[must_use]
    pub fn verification(name: impl Into<String>, email: impl Into<String>, code: &str) -> Self {
        let name = name.into();
        let body = format!(
            "Hello {name},\n\nYour verification code is: {code}\n\
             The code expires in a few minutes.\n\nLibrary Management System"
        );

        Self {
            to_name: name,
            to_email: email.into(),
            subject: VERIFICATION_SUBJECT.to_string(),
            body,
        }
    }
}

// =====================================
// Mailer Trait
// =====================================
/// ارسال‌کننده ایمیل
///
/// خطای ارسال به فراخوان برمیگرده؛ sweep یادآوری با خطا رکورد رو
/// `notified` نمیکنه تا دفعه بعد دوباره تلاش بشه.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// Mailer پیش‌فرض که فقط لاگ میکنه
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        info!(
            to = %mask_email(&message.to_email),
            subject = %message.subject,
            "Email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_uses_fixed_text() {
        let message = EmailMessage::reminder("Ali", "ali@example.com");

        assert_eq!(message.subject, REMINDER_SUBJECT);
        assert!(message.body.contains("due in 24 hours"));
        assert_eq!(message.to_email, "ali@example.com");
    }

    #[test]
    fn test_verification_contains_code() {
        let message = EmailMessage::verification("Sara", "sara@example.com", "123456");

        assert!(message.body.contains("123456"));
        assert!(message.body.starts_with("Hello Sara"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        LogMailer
            .send(EmailMessage::reminder("Ali", "ali@example.com"))
            .await
            .unwrap();
    }
}
