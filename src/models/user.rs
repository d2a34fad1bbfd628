//! # مدل کاربر (User Model)
//!
//! Entity و DTO‌های مربوط به کاربر

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Id;
use crate::error::{Result, ResultExt};

// =====================================
// Role
// =====================================
/// نقش کاربر
///
/// در دیتابیس به صورت متن (`admin` / `user`) ذخیره میشه.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::User => write!(f, "User"),
        }
    }
}

// =====================================
// User Entity
// =====================================
/// Entity کاربر
///
/// امنیت: `password_hash` و کد تایید هرگز به کلاینت ارسال نمیشن،
/// برای همین این struct `Serialize` نداره.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub account_verified: bool,
    pub verification_code: Option<String>,
    pub verification_code_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// بررسی رمز عبور با Argon2
    ///
    /// # Errors
    /// خطا برمیگردونه اگه hash ذخیره شده قابل parse نباشه
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        use argon2::{Argon2, PasswordHash, PasswordVerifier};

        let parsed_hash = PasswordHash::new(&self.password_hash)
            .map_internal()?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// آیا کد تایید تا لحظه `now` منقضی شده؟
    #[must_use]
    pub fn verification_expired(&self, now: DateTime<Utc>) -> bool {
        self.verification_code_expires_at
            .map_or(true, |expires_at| expires_at < now)
    }
}

/// هش رمز عبور با Argon2 و salt تصادفی
///
/// # Errors
/// خطا برمیگردونه اگه hashing fail بشه
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_internal()?
        .to_string())
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            account_verified: user.account_verified,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            account_verified: user.account_verified,
            created_at: user.created_at,
        }
    }
}

// =====================================
// Create User DTO
// =====================================
/// داده برای ساخت کاربر (داخلی)
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub account_verified: bool,
    pub verification_code: Option<String>,
    pub verification_code_expires_at: Option<DateTime<Utc>>,
}

impl CreateUser {
    /// ساخت کاربر جدید با هش کردن رمز عبور
    ///
    /// کاربر جدید تایید نشده هست تا وقتی کد تایید رو وارد کنه.
    ///
    /// # Errors
    /// خطا برمیگردونه اگه hashing fail بشه
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: &str,
        role: Role,
    ) -> Result<Self> {
        let password_hash = hash_password(password)?;

        Ok(Self {
            id: Id::new().into_string(),
            name: name.into(),
            email: email.into(),
            password_hash,
            role,
            account_verified: false,
            verification_code: None,
            verification_code_expires_at: None,
        })
    }

    /// اضافه کردن کد تایید
    #[must_use]
    pub fn with_verification_code(
        mut self,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.verification_code = Some(code.into());
        self.verification_code_expires_at = Some(expires_at);
        self
    }

    /// حساب از قبل تایید شده (ادمین‌ها)
    #[must_use]
    pub fn verified(mut self) -> Self {
        self.account_verified = true;
        self.verification_code = None;
        self.verification_code_expires_at = None;
        self
    }
}

// =====================================
// API Request DTOs
// =====================================
/// درخواست ثبت‌نام
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// درخواست تایید حساب
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyAccountRequest {
    #[validate(length(min = 1, message = "Verification Code is required"))]
    pub verification_code: String,
}

/// درخواست ورود
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// درخواست تغییر رمز عبور
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current Password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

// =====================================
// API Response DTOs
// =====================================
/// پاسخ اطلاعات کاربر
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub account_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// پاسخ ورود موفق
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// پاسخ ثبت‌نام
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}

// =====================================
// JWT Claims
// =====================================
/// محتویات توکن JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// شناسه کاربر
    pub sub: String,
    pub email: String,
    pub role: Role,

    /// زمان انقضا (Unix timestamp)
    pub exp: i64,

    /// زمان صدور
    pub iat: i64,
}

impl Claims {
    #[must_use]
    pub fn new(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(expiration_hours as i64);

        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}
