//! # مدل کتاب (Book Model)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Id;

// =====================================
// Book Entity
// =====================================
/// Entity کتاب
///
/// `availability` همیشه از `quantity` محاسبه میشه و هیچوقت مستقل ست نمیشه.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,

    /// قیمت (واحد پول کامل)
    pub price: i64,

    /// تعداد نسخه‌های موجود، هیچوقت منفی نیست
    pub quantity: i64,

    pub availability: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// آیا نسخه‌ای برای امانت هست؟
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// داده برای ساخت کتاب (داخلی)
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
}

impl CreateBook {
    #[must_use]
    pub fn availability(&self) -> bool {
        self.quantity > 0
    }
}

// =====================================
// API Request DTOs
// =====================================
/// درخواست افزودن کتاب
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Book Title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "Book Author is required"))]
    pub author: String,

    #[validate(length(min = 1, max = 2000, message = "Book Description is required"))]
    pub description: String,

    #[validate(range(min = 0, max = 1000000000, message = "Book Price must be between 0 and 1000000000"))]
    pub price: i64,

    #[validate(range(min = 0, message = "Book Quantity cannot be negative"))]
    pub quantity: i64,
}

impl From<CreateBookRequest> for CreateBook {
    fn from(request: CreateBookRequest) -> Self {
        Self {
            id: Id::new().into_string(),
            title: request.title.trim().to_string(),
            author: request.author.trim().to_string(),
            description: request.description.trim().to_string(),
            price: request.price,
            quantity: request.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(quantity: i64) -> CreateBookRequest {
        CreateBookRequest {
            title: "  Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            description: "Desert planet".to_string(),
            price: 100,
            quantity,
        }
    }

    #[test]
    fn test_create_book_trims_and_derives_availability() {
        let book = CreateBook::from(request(0));
        assert_eq!(book.title, "Dune");
        assert!(!book.availability());

        assert!(CreateBook::from(request(2)).availability());
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        assert!(request(-1).validate().is_err());
        assert!(request(1).validate().is_ok());
    }

    #[test]
    fn test_price_is_bounded() {
        let mut req = request(1);
        req.price = 1_000_000_001;
        assert!(req.validate().is_err());

        req.price = 1_000_000_000;
        assert!(req.validate().is_ok());
    }
}
