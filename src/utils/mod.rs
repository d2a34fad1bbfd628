//! # ماژول توابع کمکی (Utilities)
//!
//! کد تایید حساب، نرمال‌سازی email و فرمت مبالغ.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Constants
// =====================================
/// طول کد تایید حساب
pub const VERIFICATION_CODE_LENGTH: usize = 6;

/// پیشوند مبالغ در پیام‌ها
pub const CURRENCY_PREFIX: &str = "Rs.";

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
/// الگوی معتبر برای کد تایید (۶ رقم)
pub static VALID_VERIFICATION_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{6}$").expect("Invalid regex pattern"));

// =====================================
// Verification Codes
// =====================================
/// تولید کد تایید ۶ رقمی
///
/// # مثال
/// ```rust
/// use library_service::utils::{generate_verification_code, is_valid_verification_code};
///
/// let code = generate_verification_code();
/// assert!(is_valid_verification_code(&code));
/// ```
#[must_use]
pub fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();

    // رقم اول صفر نیست
    let first = rng.gen_range(1..=9u8);
    std::iter::once(first)
        .chain((1..VERIFICATION_CODE_LENGTH).map(|_| rng.gen_range(0..=9u8)))
        .map(|d| char::from(b'0' + d))
        .collect()
}

#[must_use]
pub fn is_valid_verification_code(code: &str) -> bool {
    VALID_VERIFICATION_CODE.is_match(code)
}

// =====================================
// Email Utilities
// =====================================
/// نرمال‌سازی email برای مقایسه و ذخیره
///
/// ```rust
/// use library_service::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Ali@Example.COM "), "ali@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mask کردن email برای لاگ‌ها
///
/// ```rust
/// use library_service::utils::mask_email;
///
/// assert_eq!(mask_email("reader@example.com"), "re***@example.com");
/// ```
#[must_use]
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}

// =====================================
// Money
// =====================================
/// فرمت مبلغ برای پیام‌های کاربر
#[must_use]
pub fn format_charge(amount: i64) -> String {
    format!("{CURRENCY_PREFIX} {amount}")
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), VERIFICATION_CODE_LENGTH);
            assert!(is_valid_verification_code(&code));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_code_validation() {
        assert!(is_valid_verification_code("123456"));
        assert!(!is_valid_verification_code("12345"));
        assert!(!is_valid_verification_code("12345a"));
        assert!(!is_valid_verification_code(" 123456"));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("a@b.com"), "a***@b.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_format_charge() {
        assert_eq!(format_charge(120), "Rs. 120");
        assert_eq!(format_charge(0), "Rs. 0");
    }
}
